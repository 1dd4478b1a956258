// src/core/commands/probe/status.rs

use crate::core::commands::command_trait::{ActionContext, ActionHandler, ActionResult};
use crate::core::process::ProcessSpec;
use async_trait::async_trait;

/// Uptime plus the running containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusProbe;

/// `docker ps` in the one-line-per-container form used by `/status` and `/health`.
pub fn container_list_spec() -> ProcessSpec {
    ProcessSpec::new("docker").args(["ps", "--format", "{{.Names}} ({{.Status}})"])
}

#[async_trait]
impl ActionHandler for StatusProbe {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        let runner = &ctx.state.runner;
        let timeout = ctx.state.config.probe_timeout;

        let uptime_spec = ProcessSpec::new("uptime").arg("-p");
        let containers_spec = container_list_spec();
        let (uptime, containers) = tokio::join!(
            runner.run_checked(&uptime_spec, timeout),
            runner.run_checked(&containers_spec, timeout)
        );

        let uptime = match uptime {
            Ok(output) => output.stdout.trim().to_string(),
            Err(e) => return ActionResult::from_error("Could not read server status", &e),
        };
        let containers = match containers {
            Ok(output) => output.stdout.trim().to_string(),
            Err(e) => return ActionResult::from_error("Could not read server status", &e),
        };
        let containers = if containers.is_empty() {
            "(no running containers)".to_string()
        } else {
            containers
        };

        ActionResult::ok(
            "Server is up",
            format!("Uptime: {uptime}\n\nContainers:\n{containers}"),
        )
    }
}
