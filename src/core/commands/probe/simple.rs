// src/core/commands/probe/simple.rs

use crate::config::Config;
use crate::core::commands::command_trait::{ActionContext, ActionHandler, ActionResult};
use crate::core::process::ProcessSpec;
use async_trait::async_trait;

/// A probe that runs one command and reports its stdout.
pub struct CommandProbe {
    headline: &'static str,
    failure_headline: &'static str,
    build: fn(&Config) -> ProcessSpec,
}

impl CommandProbe {
    pub fn new(
        headline: &'static str,
        failure_headline: &'static str,
        build: fn(&Config) -> ProcessSpec,
    ) -> Self {
        Self {
            headline,
            failure_headline,
            build,
        }
    }

    pub fn docker_status() -> Self {
        Self::new("Docker containers", "Could not list containers", |_| {
            ProcessSpec::new("docker").args([
                "ps",
                "--all",
                "--format",
                "{{.Names}}\t{{.Status}}\t{{.Image}}",
            ])
        })
    }

    pub fn disk() -> Self {
        Self::new("Disk usage", "Could not read disk usage", |_| {
            ProcessSpec::new("df").args(["-h", "-x", "tmpfs", "-x", "devtmpfs"])
        })
    }

    pub fn memory() -> Self {
        Self::new("Memory usage", "Could not read memory usage", |_| {
            ProcessSpec::new("free").arg("-h")
        })
    }

    pub fn version() -> Self {
        Self::new("Service version", "Could not read the version", |config| {
            ProcessSpec::new("docker")
                .arg("exec")
                .arg(config.container.clone())
                .args(["n8n", "--version"])
        })
    }
}

#[async_trait]
impl ActionHandler for CommandProbe {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        let config = &ctx.state.config;
        let spec = (self.build)(config);
        match ctx.state.runner.run_checked(&spec, config.probe_timeout).await {
            Ok(output) => {
                let body = output.stdout.trim();
                if body.is_empty() {
                    ActionResult::prose(self.headline, "(no output)")
                } else {
                    ActionResult::ok(self.headline, body)
                }
            }
            Err(e) => ActionResult::from_error(self.failure_headline, &e),
        }
    }
}
