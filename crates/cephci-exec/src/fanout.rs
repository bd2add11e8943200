use std::sync::Arc;

use tracing::info;

use cephci_model::{CommandOutput, ExecOptions};

use crate::{
    node::Node,
    parallel::{self, ParallelConfig, ParallelError},
};

/// Output of one node in a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutput {
    pub hostname: String,
    pub output: CommandOutput,
}

/// Runs `cmd` on every node concurrently.
///
/// Outputs come back in completion order. The first node that fails aborts the
/// fan-out; nodes whose command has not started yet are skipped.
pub fn exec_on_nodes(
    nodes: &[Arc<dyn Node>],
    cmd: &str,
    opts: &ExecOptions,
    cfg: &ParallelConfig,
) -> Result<Vec<NodeOutput>, ParallelError> {
    info!(target: "cephci.exec.fanout", nodes = nodes.len(), cmd, "fan-out");
    parallel::scope(cfg.clone(), |p| {
        for node in nodes {
            let node = Arc::clone(node);
            let cmd = cmd.to_string();
            let opts = opts.clone();
            p.spawn_named(node.hostname().to_string(), move || {
                let output = node.exec_command(&cmd, &opts)?;
                Ok(NodeOutput {
                    hostname: node.hostname().to_string(),
                    output,
                })
            })?;
        }
        p.by_ref().collect()
    })
}
