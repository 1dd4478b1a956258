// src/server/context.rs

use crate::core::protocol::InboundMessage;
use crate::core::state::RelayState;
use crate::core::transport::telegram::TelegramApi;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;

/// Holds all the initialized state required to run the relay's main loop.
pub struct RelayContext {
    pub state: Arc<RelayState>,
    pub api: Arc<TelegramApi>,
    /// Sender half handed to the poller by the spawner.
    pub inbound_tx: Option<mpsc::Sender<InboundMessage>>,
    pub inbound_rx: mpsc::Receiver<InboundMessage>,
    /// Taken by the spawner for the file cleaner task.
    pub cleanup_rx: Option<mpsc::Receiver<PathBuf>>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_tasks: JoinSet<Result<(), anyhow::Error>>,
}
