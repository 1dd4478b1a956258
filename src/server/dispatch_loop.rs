// src/server/dispatch_loop.rs

//! Contains the main relay loop for dispatching inbound messages and handling graceful shutdown.

use super::context::RelayContext;
use crate::core::handler::{DispatchOutcome, Dispatcher};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long background tasks get to finish after in-flight commands are done.
const BACKGROUND_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// The main loop: receives messages in arrival order and runs each dispatch as its own task.
pub async fn run(mut ctx: RelayContext) -> Result<()> {
    let dispatcher = Dispatcher::new(ctx.state.clone());
    let mut command_tasks: JoinSet<DispatchOutcome> = JoinSet::new();

    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;

    info!("Relay is ready and waiting for commands.");

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => { error!("CRITICAL: Background task failed: {}. Shutting down.", e); break; }
                    Err(e) => { error!("CRITICAL: Background task panicked: {e:?}. Shutting down."); break; }
                }
            },

            maybe_message = ctx.inbound_rx.recv() => {
                let Some(message) = maybe_message else {
                    warn!("Inbound channel closed; no more messages will arrive.");
                    break;
                };
                let dispatcher = dispatcher.clone();
                command_tasks.spawn(async move { dispatcher.dispatch(message).await });
            },

            Some(res) = command_tasks.join_next() => {
                match res {
                    Ok(outcome) => debug!("Dispatch finished: {:?}", outcome),
                    Err(e) if e.is_panic() => error!("A dispatch task panicked: {e:?}"),
                    Err(_) => {}
                }
            },
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        warn!("No background task was listening for the shutdown signal.");
    }
    ctx.inbound_rx.close();

    if !command_tasks.is_empty() {
        // A deploy step is the longest thing that can be in flight.
        let grace = ctx.state.config.update.timeout;
        info!(
            "Waiting up to {:?} for {} in-flight command(s)...",
            grace,
            command_tasks.len()
        );
        if tokio::time::timeout(grace, async {
            while command_tasks.join_next().await.is_some() {}
        })
        .await
        .is_err()
        {
            warn!("Timed out waiting for in-flight commands; aborting them.");
            command_tasks.shutdown().await;
        }
    }

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(BACKGROUND_SHUTDOWN_TIMEOUT, async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    };
    info!("Relay shutdown complete.");
    Ok(())
}
