//! Hosts a command can be run on.
mod local;
mod ssh;

pub use local::LocalNode;
pub use ssh::SshNode;

use cephci_model::{CommandOutput, ExecOptions};

use crate::error::ExecError;

/// A cluster node that can run shell commands.
///
/// Implementations block the calling thread until the command finishes, so a
/// node is typically driven from a [`Parallel`](crate::parallel::Parallel) task.
pub trait Node: Send + Sync {
    fn hostname(&self) -> &str;

    fn exec_command(&self, cmd: &str, opts: &ExecOptions) -> Result<CommandOutput, ExecError>;
}
