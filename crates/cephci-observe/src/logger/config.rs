use std::path::PathBuf;

use cephci_model::RunConfig;

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Size-based rollover for the run's log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Roll the file over before it would grow past this many bytes.
    pub max_bytes: u64,
    /// Number of `<file>.N` backups to keep. `0` disables rollover.
    pub backups: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            backups: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
    /// Directory for `<name>.log` and `<name>.err`. No files are written when `None`.
    pub log_dir: Option<PathBuf>,
    pub disable_console: bool,
    pub rotation: RotationPolicy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || atty::is(atty::Stream::Stdout);
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
            log_dir: None,
            disable_console: false,
            rotation: RotationPolicy::default(),
        }
    }
}

impl LoggerConfig {
    /// Logger settings for a harness run: files go to the run directory.
    pub fn from_run(run: &RunConfig) -> Result<Self, LoggerError> {
        Ok(Self {
            format: run.log_format.parse()?,
            level: run.log_level.clone(),
            log_dir: Some(run.run_dir.clone()),
            disable_console: run.disable_console,
            ..Self::default()
        })
    }
}
