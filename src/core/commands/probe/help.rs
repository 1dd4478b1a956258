// src/core/commands/probe/help.rs

use crate::core::commands::Registry;
use crate::core::commands::command_trait::{ActionContext, ActionHandler, ActionResult};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct HelpCommand;

/// One line per registered command, in registration order.
pub fn help_text(registry: &Registry) -> String {
    registry
        .commands()
        .map(|cmd| format!("/{} — {}", cmd.keyword.replace('-', "_"), cmd.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ActionHandler for HelpCommand {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        ActionResult::prose("Available commands", help_text(&ctx.state.registry))
    }
}
