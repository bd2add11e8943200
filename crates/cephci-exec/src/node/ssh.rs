use tracing::debug;

use cephci_model::{CommandOutput, ExecOptions, NodeSpec};

use crate::{
    error::ExecError,
    node::Node,
    util::{cmd_program, run_command, with_sudo},
};

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Remote node reached through the system `ssh` client in batch mode.
#[derive(Debug, Clone)]
pub struct SshNode {
    spec: NodeSpec,
    connect_timeout_secs: u64,
}

impl SshNode {
    pub fn new(spec: NodeSpec) -> Self {
        Self {
            spec,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
        }
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs.max(1);
        self
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    /// Arguments passed to `ssh` for `remote_cmd`.
    pub fn ssh_args(&self, remote_cmd: &str) -> Vec<String> {
        vec![
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            "-p".into(),
            self.spec.port.to_string(),
            self.spec.destination(),
            remote_cmd.to_string(),
        ]
    }
}

impl Node for SshNode {
    fn hostname(&self) -> &str {
        &self.spec.hostname
    }

    fn exec_command(&self, cmd: &str, opts: &ExecOptions) -> Result<CommandOutput, ExecError> {
        if cmd.trim().is_empty() {
            return Err(ExecError::MissingProgram);
        }
        let line = with_sudo(cmd, opts);
        debug!(
            target: "cephci.exec.ssh",
            host = %self.spec.hostname,
            dest = %self.spec,
            cmd = %line,
            "exec"
        );
        run_command(cmd_program("ssh", &self.ssh_args(&line)), opts)
    }
}
