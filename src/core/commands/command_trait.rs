// src/core/commands/command_trait.rs

//! Defines the trait every action handler implements and the result it produces.

use crate::core::RelayError;
use crate::core::state::RelayState;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// A file to deliver instead of inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub path: PathBuf,
    pub caption: String,
    /// Set for per-request dumps that the cleaner removes after delivery.
    pub transient: bool,
}

/// The outcome of one dispatched command. Consumed exactly once by the packager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    /// A one-line summary shown next to the status marker.
    pub headline: String,
    pub body: String,
    /// Render `body` in a fixed-width block rather than as prose.
    pub preformatted: bool,
    pub file: Option<FilePayload>,
    pub error: Option<String>,
}

impl ActionResult {
    /// A successful result whose body is command output.
    pub fn ok(headline: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            success: true,
            headline: headline.into(),
            body: body.into(),
            preformatted: true,
            file: None,
            error: None,
        }
    }

    /// A successful result whose body is prose rather than command output.
    pub fn prose(headline: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            preformatted: false,
            ..Self::ok(headline, body)
        }
    }

    pub fn file(headline: impl Into<String>, payload: FilePayload) -> Self {
        Self {
            success: true,
            headline: headline.into(),
            body: String::new(),
            preformatted: false,
            file: Some(payload),
            error: None,
        }
    }

    pub fn failed(headline: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            headline: headline.into(),
            body: String::new(),
            preformatted: true,
            file: None,
            error: Some(detail.into()),
        }
    }

    pub fn from_error(headline: impl Into<String>, err: &RelayError) -> Self {
        Self::failed(headline, err.to_string())
    }
}

/// Everything a handler may use while running. Owned so handlers can be moved into tasks.
#[derive(Clone)]
pub struct ActionContext {
    pub state: Arc<RelayState>,
    /// The arrival order of the triggering message, unique for the process lifetime.
    pub request_id: u64,
    /// The keyword the operator typed.
    pub keyword: &'static str,
}

/// The execution logic behind a registered keyword.
///
/// Handlers never fail outward: every error is folded into the returned
/// [`ActionResult`] so the dispatcher always has exactly one response to send.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(&self, ctx: &ActionContext) -> ActionResult;
}
