// src/core/state/mod.rs

//! The explicit runtime context shared by the dispatcher and every handler.
//!
//! It is built once at startup and handed around as `Arc<RelayState>`; nothing
//! in the relay lives in module-level globals apart from the metric registry.

mod guards;

pub use guards::{PipelineGuard, PipelineGuards};

use crate::config::Config;
use crate::core::RelayError;
use crate::core::commands::{self, Registry};
use crate::core::process::ProcessRunner;
use crate::core::protocol::Principal;
use crate::core::transport::Transport;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the transient-file cleanup queue.
const CLEANUP_QUEUE_CAPACITY: usize = 64;

/// Shared, immutable-after-startup state of the relay.
pub struct RelayState {
    pub config: Arc<Config>,
    pub principal: Principal,
    pub registry: Registry,
    pub transport: Arc<dyn Transport>,
    pub runner: Arc<dyn ProcessRunner>,
    /// HTTP client for the health endpoint probe.
    pub http: reqwest::Client,
    /// Mutual exclusion for mutating pipelines, keyed by pipeline identity.
    pub pipelines: PipelineGuards,
    /// Paths of delivered transient files, consumed by the cleaner task.
    pub cleanup_tx: mpsc::Sender<PathBuf>,
}

/// The state plus the receiving ends that background tasks take ownership of.
pub struct RelayInit {
    pub state: Arc<RelayState>,
    pub cleanup_rx: mpsc::Receiver<PathBuf>,
}

impl RelayState {
    /// Builds the relay state with the default command registry.
    pub fn initialize(
        config: Config,
        transport: Arc<dyn Transport>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<RelayInit, RelayError> {
        let registry = commands::default_registry()?;
        Self::with_registry(config, registry, transport, runner)
    }

    /// Builds the relay state around an explicit registry.
    pub fn with_registry(
        config: Config,
        registry: Registry,
        transport: Arc<dyn Transport>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<RelayInit, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(config.probe_timeout)
            .build()?;
        let (cleanup_tx, cleanup_rx) = mpsc::channel(CLEANUP_QUEUE_CAPACITY);

        let state = Arc::new(RelayState {
            principal: config.principal.clone(),
            config: Arc::new(config),
            registry,
            transport,
            runner,
            http,
            pipelines: PipelineGuards::default(),
            cleanup_tx,
        });

        Ok(RelayInit { state, cleanup_rx })
    }
}
