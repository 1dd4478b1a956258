// src/core/commands/probe/health.rs

use super::status::container_list_spec;
use crate::core::commands::command_trait::{ActionContext, ActionHandler, ActionResult};
use async_trait::async_trait;
use tracing::warn;
use url::Url;

/// Container state, plus the HTTP health endpoint when one is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthProbe;

#[async_trait]
impl ActionHandler for HealthProbe {
    async fn run(&self, ctx: &ActionContext) -> ActionResult {
        let state = &ctx.state;
        let spec = container_list_spec();
        let containers = match state
            .runner
            .run_checked(&spec, state.config.probe_timeout)
            .await
        {
            Ok(output) => output.stdout.trim().to_string(),
            Err(e) => return ActionResult::from_error("Health check failed", &e),
        };

        let mut body = format!("Containers:\n{containers}");

        if let Some(url) = &state.config.health_url {
            match check_endpoint(&state.http, url).await {
                Ok(status) => body.push_str(&format!("\n\nEndpoint {url}: {status}")),
                Err(detail) => {
                    warn!("Health endpoint {} failed: {}", url, detail);
                    let mut result = ActionResult::failed("Health endpoint is unreachable", detail);
                    result.body = body;
                    return result;
                }
            }
        }

        ActionResult::ok("Services are healthy", body)
    }
}

/// Returns the status line on a 2xx response, an error description otherwise.
async fn check_endpoint(client: &reqwest::Client, url: &Url) -> Result<String, String> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| format!("{url}: {e}"))?;
    let status = response.status();
    if status.is_success() {
        Ok(status.to_string())
    } else {
        Err(format!("{url} returned {status}"))
    }
}
