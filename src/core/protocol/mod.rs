// src/core/protocol/mod.rs

//! Message types exchanged between the transport and the dispatch engine.

use std::fmt;
use std::path::PathBuf;

/// The opaque identifier of the single operator allowed to issue commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the given sender id is this principal.
    pub fn matches(&self, sender_id: &str) -> bool {
        self.0 == sender_id.trim()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message received from the transport. Read-only to the core and discarded after dispatch.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// The chat/user id the message came from; replies go back here.
    pub sender_id: String,
    pub text: String,
    /// Monotonic receive counter assigned by the transport.
    pub arrival_order: u64,
}

impl InboundMessage {
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>, arrival_order: u64) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            arrival_order,
        }
    }
}

/// How the transport should interpret the text of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    Plain,
    /// Telegram MarkdownV2; all special characters in the text are already escaped.
    MarkdownV2,
}

/// A chat activity hint shown to the operator while a long action is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Typing,
    UploadingDocument,
}

/// The single response produced for a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text {
        text: String,
        format: FormatHint,
    },
    File {
        path: PathBuf,
        caption: String,
        /// The file is a per-request dump and must be removed once sent.
        transient: bool,
    },
}

impl OutboundMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        OutboundMessage::Text {
            text: text.into(),
            format: FormatHint::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        OutboundMessage::Text {
            text: text.into(),
            format: FormatHint::MarkdownV2,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, OutboundMessage::File { .. })
    }
}
