use std::{process::Stdio, time::Duration};

use tokio::process::Command;
use tracing::{debug, trace};

use cephci_model::{CommandOutput, ExecOptions};

use crate::error::{ExecError, ExecResult};

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

/// Runs `cmd` to completion on a private current-thread runtime.
///
/// Blocks the calling thread, so this is meant for worker threads of a
/// [`Parallel`](crate::parallel::Parallel) scope, never for async contexts.
pub fn run_command(mut cmd: Command, opts: &ExecOptions) -> ExecResult<CommandOutput> {
    for (k, v) in &opts.env {
        cmd.env(k, v);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;

    let output = rt.block_on(async move {
        let child = cmd.spawn().map_err(|e| ExecError::Spawn(e.to_string()))?;
        let wait = child.wait_with_output();
        let res = match opts.timeout_ms {
            // The child future is dropped on timeout, which kills the process.
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), wait)
                .await
                .map_err(|_| ExecError::Timeout { ms })?,
            None => wait.await,
        };
        res.map_err(ExecError::from)
    })?;

    let out = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
    };
    trace!(target: "cephci.exec.proc", exit_code = ?out.exit_code, "exited");

    if opts.check_ec.is_enabled() && !out.success() {
        return Err(match out.exit_code {
            Some(code) => ExecError::NonZeroExit {
                code,
                stderr: out.stderr.trim_end().to_string(),
            },
            None => ExecError::KilledBySignal,
        });
    }
    debug!(target: "cephci.exec.proc", exit_code = ?out.exit_code, "exit");
    Ok(out)
}

/// Prefixes the shell command with `sudo` when requested.
pub fn with_sudo(cmd: &str, opts: &ExecOptions) -> String {
    if opts.sudo {
        format!("sudo {cmd}")
    } else {
        cmd.to_string()
    }
}
