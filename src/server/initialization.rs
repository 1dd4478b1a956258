// src/server/initialization.rs

//! Builds the transport, process runner and relay state before the main loop starts.

use super::context::RelayContext;
use crate::config::Config;
use crate::core::process::SystemProcessRunner;
use crate::core::state::RelayState;
use crate::core::transport::telegram::{TelegramApi, TelegramTransport};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Capacity of the queue between the poller and the dispatch loop.
const INBOUND_QUEUE_CAPACITY: usize = 128;

/// Initializes all relay components before starting the main loop.
pub async fn setup(config: Config) -> Result<RelayContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let api = Arc::new(
        TelegramApi::new(
            &config.bot_token,
            &config.api_base_url,
            config.poll_timeout_secs,
        )
        .context("Failed to build the Telegram API client")?,
    );

    // An unreachable API at startup is not fatal; the poller keeps retrying.
    match api.get_me().await {
        Ok(me) => info!(
            "Connected to Telegram as @{} (id {}).",
            me.username.as_deref().unwrap_or("unknown"),
            me.id
        ),
        Err(e) => warn!("Could not verify the bot credential: {}. Continuing.", e),
    }

    let transport = Arc::new(TelegramTransport::new(api.clone()));
    let runner = Arc::new(SystemProcessRunner);
    let relay_init = RelayState::initialize(config, transport, runner)
        .context("Failed to initialize relay state")?;
    info!(
        "Relay state initialized with {} commands.",
        relay_init.state.registry.len()
    );

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);

    Ok(RelayContext {
        state: relay_init.state,
        api,
        inbound_tx: Some(inbound_tx),
        inbound_rx,
        cleanup_rx: Some(relay_init.cleanup_rx),
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

fn log_startup_info(config: &Config) {
    info!(
        "opsrelay {} starting for principal {}.",
        env!("OPSRELAY_VERSION"),
        config.principal
    );
    info!(
        "Managing container '{}'; backups in {}.",
        config.container,
        config.backup.dir.display()
    );
    match &config.health_url {
        Some(url) => info!("Health endpoint: {}", url),
        None => info!("No health endpoint configured; /health checks containers only."),
    }
}
