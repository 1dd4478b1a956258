// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod context;
mod dispatch_loop;
mod initialization;
mod metrics_server;
mod spawner;

/// The main relay startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Initialize relay state, transport and process runner.
    let mut relay_context = initialization::setup(config).await?;

    // 2. Spawn all background tasks (poller, file cleaner, metrics).
    spawner::spawn_all(&mut relay_context)?;

    // 3. Dispatch inbound messages until shutdown.
    dispatch_loop::run(relay_context).await
}
