// src/core/commands/maintenance/update.rs

use super::backup::{BACKUP_PIPELINE, backup_step};
use crate::config::Config;
use crate::core::commands::command_trait::{ActionContext, ActionHandler, ActionResult};
use crate::core::commands::pipeline::{Pipeline, PipelineStep};
use crate::core::process::ProcessSpec;
use async_trait::async_trait;

pub const UPDATE_PIPELINE: &str = "update";

/// Backs up, then deploys. The deploy never starts if the backup fails.
///
/// The backup step also holds the `/backup` guard, so the backup script never
/// runs twice at once. A `/backup` may still run while the deploy step does.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateCommand;

/// The step that runs the update script, rebuilding the managed container.
pub fn deploy_step(config: &Config) -> PipelineStep {
    PipelineStep {
        name: "deploy",
        process: ProcessSpec::new("bash").arg(config.update.script.clone()),
        timeout: config.update.timeout,
        on_failure: "Update failed".to_string(),
        shares_guard_with: None,
    }
}

#[async_trait]
impl ActionHandler for UpdateCommand {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        let config = &ctx.state.config;
        let mut backup = backup_step(config);
        backup.on_failure = "Update aborted, pre-update backup failed".to_string();
        backup.shares_guard_with = Some(BACKUP_PIPELINE);

        Pipeline::new(UPDATE_PIPELINE)
            .step(backup)
            .step(deploy_step(config))
            .run(&ctx.state)
            .await
            .into_result("Update completed", "Update not started")
    }
}
