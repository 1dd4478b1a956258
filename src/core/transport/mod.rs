// src/core/transport/mod.rs

//! The messaging transport boundary.
//!
//! Inbound messages are pushed by a transport-specific poller into an mpsc
//! channel; outbound delivery goes through the [`Transport`] trait.

pub mod telegram;

use crate::core::RelayError;
use crate::core::protocol::{Activity, FormatHint};
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message to `recipient`.
    async fn send_text(
        &self,
        recipient: &str,
        text: &str,
        format: FormatHint,
    ) -> Result<(), RelayError>;

    /// Uploads the file at `path` to `recipient` with a plain-text caption.
    async fn send_file(&self, recipient: &str, path: &Path, caption: &str)
    -> Result<(), RelayError>;

    /// Shows a transient activity hint. Transports without one do nothing.
    async fn send_activity(&self, _recipient: &str, _activity: Activity) -> Result<(), RelayError> {
        Ok(())
    }
}
