use tracing::debug;

use cephci_model::{CommandOutput, ExecOptions};

use crate::{
    error::{ExecError, ExecResult},
    node::Node,
    util::{cmd_program, run_command, with_sudo},
};

/// The machine the run executes on, driven through `sh -c`.
#[derive(Debug, Clone)]
pub struct LocalNode {
    hostname: String,
}

impl LocalNode {
    /// Resolves the hostname of the current machine.
    pub fn new() -> ExecResult<Self> {
        let hostname = hostname::get()?.to_string_lossy().into_owned();
        Ok(Self { hostname })
    }

    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}

impl Node for LocalNode {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn exec_command(&self, cmd: &str, opts: &ExecOptions) -> Result<CommandOutput, ExecError> {
        if cmd.trim().is_empty() {
            return Err(ExecError::MissingProgram);
        }
        let line = with_sudo(cmd, opts);
        debug!(target: "cephci.exec.proc", host = %self.hostname, cmd = %line, "exec");
        run_command(cmd_program("sh", &["-c".into(), line]), opts)
    }
}
