// src/core/commands/logs.rs

//! Tails the managed container's logs.
//!
//! Output at or under the inline ceiling is returned as text, provided the
//! escaped message still fits the transport limit whole. Anything else is
//! written to a per-request dump file and returned as a file payload; the
//! dispatcher hands the path to the cleaner once the file has been sent.

use super::command_trait::{ActionContext, ActionHandler, ActionResult, FilePayload};
use crate::core::packager::renders_inline;
use crate::core::process::ProcessSpec;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogsCommand;

/// The dump path for one request. Unique per process and request, so two
/// overlapping log requests never write the same file.
pub fn dump_path(dir: &Path, request_id: u64) -> PathBuf {
    dir.join(format!(
        "opsrelay-logs-{}-{}.txt",
        std::process::id(),
        request_id
    ))
}

#[async_trait]
impl ActionHandler for LogsCommand {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        let config = &ctx.state.config;
        let spec = ProcessSpec::new("docker")
            .arg("logs")
            .arg(format!("--tail={}", config.logs.tail_lines))
            .arg(config.container.clone());

        let output = match ctx.state.runner.run_checked(&spec, config.logs.timeout).await {
            Ok(output) => output.combined(),
            Err(e) => {
                return ActionResult::from_error(
                    format!("Could not read logs of {}", config.container),
                    &e,
                );
            }
        };

        let headline = format!("Logs of {}", config.container);
        if output.trim().is_empty() {
            return ActionResult::prose(headline, "The container has not logged anything yet.");
        }

        if renders_inline(&headline, &output, config.logs.inline_ceiling) {
            return ActionResult::ok(headline, output);
        }

        let path = dump_path(&config.logs.dump_dir, ctx.request_id);
        debug!(
            "Log output is {} chars and does not fit inline under the {} char ceiling; writing {}",
            output.chars().count(),
            config.logs.inline_ceiling,
            path.display()
        );
        if let Err(e) = tokio::fs::write(&path, output.as_bytes()).await {
            error!("Failed to write log dump {}: {}", path.display(), e);
            return ActionResult::failed(
                format!("Could not write the log dump for {}", config.container),
                e.to_string(),
            );
        }

        ActionResult::file(
            headline,
            FilePayload {
                path,
                caption: format!(
                    "Last {} lines, {} chars, captured {}",
                    config.logs.tail_lines,
                    output.chars().count(),
                    Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
                ),
                transient: true,
            },
        )
    }
}
