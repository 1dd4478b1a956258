// src/core/transport/telegram/mod.rs

//! Telegram Bot API transport: long-polling for inbound messages and
//! `sendMessage`/`sendDocument` for outbound ones.

pub mod api;
pub mod poller;
pub mod types;

pub use api::TelegramApi;
pub use poller::poll_loop;

use crate::core::RelayError;
use crate::core::protocol::{Activity, FormatHint};
use crate::core::transport::Transport;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Outbound side of the Telegram transport.
#[derive(Clone)]
pub struct TelegramTransport {
    api: Arc<TelegramApi>,
}

impl TelegramTransport {
    pub fn new(api: Arc<TelegramApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        recipient: &str,
        text: &str,
        format: FormatHint,
    ) -> Result<(), RelayError> {
        self.api.send_message(recipient, text, format).await
    }

    async fn send_file(
        &self,
        recipient: &str,
        path: &Path,
        caption: &str,
    ) -> Result<(), RelayError> {
        self.api.send_document(recipient, path, caption).await
    }

    async fn send_activity(&self, recipient: &str, activity: Activity) -> Result<(), RelayError> {
        self.api.send_chat_action(recipient, activity).await
    }
}
