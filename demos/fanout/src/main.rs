use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use cephci_exec::prelude::*;
use cephci_model::{ExecOptions, NodeSpec, RunConfig};
use cephci_observe::{Log, Payload};

/// Usage: `fanout <command> [local | user@host[:port]]...`
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().context("missing command")?;
    let targets: Vec<String> = args.collect();

    // 1) Logger
    let run = RunConfig::from_env()?;
    let log = Log::from_run_config(format!("fanout-{}", run.run_id), &run)?;
    log.info(Payload::map([
        ("run_id", Payload::from(&run.run_id)),
        ("command", Payload::from(&cmd)),
    ]));

    // 2) Nodes
    let nodes = if targets.is_empty() {
        vec![Arc::new(LocalNode::new()?) as Arc<dyn Node>]
    } else {
        targets
            .iter()
            .map(|t| -> anyhow::Result<Arc<dyn Node>> {
                if t == "local" {
                    return Ok(Arc::new(LocalNode::new()?));
                }
                let spec: NodeSpec = t.parse()?;
                Ok(Arc::new(SshNode::new(spec)))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };
    info!("running on {} node(s)", nodes.len());

    // 3) Fan out
    let opts = ExecOptions::new().with_timeout_ms(run.command_timeout_ms);
    let cfg = ParallelConfig {
        max_workers: run.max_workers,
        ..ParallelConfig::default()
    };
    let outputs = exec_on_nodes(&nodes, &cmd, &opts, &cfg)?;

    for out in outputs {
        log.info(format!("{}: exit {:?}", out.hostname, out.output.exit_code));
        print!("[{}] {}", out.hostname, out.output.stdout);
    }
    Ok(())
}
