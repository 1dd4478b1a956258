// src/core/commands/maintenance/backup.rs

use crate::config::Config;
use crate::core::commands::command_trait::{ActionContext, ActionHandler, ActionResult};
use crate::core::commands::pipeline::{Pipeline, PipelineStep};
use crate::core::process::ProcessSpec;
use async_trait::async_trait;

/// Pipeline identity shared by `/backup` and `/backups`.
pub const BACKUP_PIPELINE: &str = "backup";

/// Runs the backup script once.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackupCommand;

/// The step that invokes the backup script. Also the first step of an update.
pub fn backup_step(config: &Config) -> PipelineStep {
    PipelineStep {
        name: "backup",
        process: ProcessSpec::new("bash").arg(config.backup.script.clone()),
        timeout: config.backup.timeout,
        on_failure: "Backup failed".to_string(),
        shares_guard_with: None,
    }
}

#[async_trait]
impl ActionHandler for BackupCommand {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        Pipeline::new(BACKUP_PIPELINE)
            .step(backup_step(&ctx.state.config))
            .run(&ctx.state)
            .await
            .into_result("Backup completed", "A backup is already in progress")
    }
}
