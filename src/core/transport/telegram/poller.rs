// src/core/transport/telegram/poller.rs

//! Long-polling loop that turns Telegram updates into `InboundMessage`s.
//!
//! The poller does not filter by sender: authorization belongs to the gate,
//! so strangers' commands still reach it and receive a denial.

use super::api::TelegramApi;
use super::types::Update;
use crate::core::metrics;
use crate::core::protocol::InboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Polls until shutdown is signalled or the inbound channel closes.
pub async fn poll_loop(
    api: Arc<TelegramApi>,
    tx: mpsc::Sender<InboundMessage>,
    poll_timeout_secs: u64,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;
    let mut arrival_order: u64 = 0;

    info!("Telegram poller started");

    loop {
        let result = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Telegram poller shutting down");
                return Ok(());
            }
            result = api.get_updates(offset, poll_timeout_secs) => result,
        };

        let updates = match result {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                updates
            }
            Err(e) => {
                warn!("getUpdates failed: {e}, retrying in {backoff:?}");
                tokio::select! {
                    _ = shutdown_rx.recv() => return Ok(()),
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(message) = into_inbound(update, arrival_order) else {
                continue;
            };
            arrival_order += 1;
            metrics::MESSAGES_RECEIVED_TOTAL.inc();
            debug!(
                "Inbound message #{} from {}",
                message.arrival_order, message.sender_id
            );
            if tx.send(message).await.is_err() {
                info!("Inbound channel closed, stopping poller");
                return Ok(());
            }
        }
    }
}

/// Extracts a text message from an update; other update kinds yield `None`.
fn into_inbound(update: Update, arrival_order: u64) -> Option<InboundMessage> {
    let message = update.message?;
    let text = message.text?;
    Some(InboundMessage::new(
        message.chat.id.to_string(),
        text,
        arrival_order,
    ))
}
