// src/core/errors.rs

//! Defines the primary error type for the relay.

use thiserror::Error;

/// The main error enum, representing all recoverable failures inside the relay.
///
/// Configuration problems found at startup are reported through `anyhow` by the
/// binary; everything here is handled inside the dispatcher and executor boundary.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport API error: {0}")]
    Api(String),

    #[error("Failed to start '{command}': {reason}")]
    ProcessSpawn { command: String, reason: String },

    #[error("'{command}' timed out after {secs}s")]
    ProcessTimeout { command: String, secs: u64 },

    #[error("'{command}' exited with {code}: {detail}")]
    ProcessFailed {
        command: String,
        code: String,
        detail: String,
    },

    #[error("Duplicate command keyword '{0}'")]
    DuplicateKeyword(String),

    #[error("'{0}' is already in progress")]
    PipelineBusy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
