use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::RotationPolicy;

/// Append-only log file that rolls over by size.
///
/// On rollover `name.N-1` moves to `name.N` (down to `name.1`), the live file becomes
/// `name.1`, and the oldest backup beyond the policy is discarded.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    file: File,
    len: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path,
            policy,
            state: Mutex::new(State { file, len }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `n`-th backup (`name.n`).
    pub fn backup_path(&self, n: usize) -> PathBuf {
        let mut raw: OsString = self.path.as_os_str().to_owned();
        raw.push(format!(".{n}"));
        PathBuf::from(raw)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        if self.should_roll(&state, buf.len()) {
            self.roll(&mut state)?;
        }
        state.file.write_all(buf)?;
        state.len += buf.len() as u64;
        Ok(buf.len())
    }

    fn should_roll(&self, state: &State, incoming: usize) -> bool {
        self.policy.backups > 0
            && state.len > 0
            && state.len + incoming as u64 > self.policy.max_bytes
    }

    fn roll(&self, state: &mut State) -> io::Result<()> {
        state.file.flush()?;
        for n in (1..self.policy.backups).rev() {
            let src = self.backup_path(n);
            if src.exists() {
                replace(&src, &self.backup_path(n + 1))?;
            }
        }
        replace(&self.path, &self.backup_path(1))?;
        state.file = open_append(&self.path)?;
        state.len = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn replace(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.exists() {
        fs::remove_file(dst)?;
    }
    fs::rename(src, dst)
}

impl Write for &RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = &'a RotatingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}
