mod flag;
pub use flag::Flag;

mod node_spec;
pub use node_spec::{DEFAULT_SSH_PORT, NodeSpec};

mod exec;
pub use exec::{CommandOutput, ExecOptions};

/// Timeout value in milliseconds.
///
/// Used by command execution options and the run configuration.
pub type TimeoutMs = u64;
