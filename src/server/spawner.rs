// src/server/spawner.rs

//! Spawns all of the relay's long-running background tasks.

use super::context::RelayContext;
use super::metrics_server;
use crate::core::tasks::file_cleaner::FileCleanerTask;
use crate::core::transport::telegram::poll_loop;
use anyhow::{Result, anyhow};
use tracing::info;

/// Spawns all critical background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut RelayContext) -> Result<()> {
    let config = ctx.state.config.clone();
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Metrics Server ---
    if config.metrics.enabled {
        let port = config.metrics.port;
        let shutdown_rx_metrics = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            metrics_server::run_metrics_server(port, shutdown_rx_metrics).await;
            Ok(())
        });
    } else {
        info!("Prometheus metrics server is disabled in the configuration.");
    }

    // --- Transient File Cleaner ---
    let cleanup_rx = ctx
        .cleanup_rx
        .take()
        .ok_or_else(|| anyhow!("file cleaner receiver already taken"))?;
    let cleaner = FileCleanerTask::new(cleanup_rx);
    let shutdown_rx_cleaner = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        cleaner.run(shutdown_rx_cleaner).await;
        Ok(())
    });

    // --- Telegram Poller ---
    let inbound_tx = ctx
        .inbound_tx
        .take()
        .ok_or_else(|| anyhow!("inbound sender already taken"))?;
    let api = ctx.api.clone();
    let poll_timeout = config.poll_timeout_secs;
    let shutdown_rx_poller = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        poll_loop(api, inbound_tx, poll_timeout, shutdown_rx_poller).await
    });

    info!("All background tasks have been spawned.");
    Ok(())
}
