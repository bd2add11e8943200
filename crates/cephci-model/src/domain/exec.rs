use serde::{Deserialize, Serialize};

use crate::{Flag, TimeoutMs};

/// Per-call options for running a command on a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecOptions {
    /// Prefix the command with `sudo`.
    #[serde(default)]
    pub sudo: bool,
    /// Treat a non-zero exit code as an error (default: on).
    #[serde(default)]
    pub check_ec: Flag,
    /// Kill the command once this much time has passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<TimeoutMs>,
    /// Extra environment for the command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    pub fn no_check(mut self) -> Self {
        self.check_ec = Flag::disabled();
        self
    }

    pub fn with_timeout_ms(mut self, ms: TimeoutMs) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    #[inline]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
