// src/core/handler/dispatcher.rs

//! Routes one inbound message to its handler and delivers exactly one response.
//!
//! The flow for every message is gate, registry lookup, handler execution,
//! packaging, then delivery. Each stage that can end the flow early (denial,
//! unknown keyword) still produces its own single response, and a handler
//! that panics is reported as an internal failure rather than going silent.

use super::gate::{self, GateDecision};
use crate::core::commands::command_trait::{ActionContext, ActionResult};
use crate::core::commands::{Command, CommandKind, Resolution};
use crate::core::metrics;
use crate::core::packager;
use crate::core::protocol::{Activity, InboundMessage, OutboundMessage};
use crate::core::state::RelayState;
use crate::core::tasks::file_cleaner::remove_transient;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// What happened to a dispatched message. Returned for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No response was produced.
    Ignored,
    /// The sender is not the principal; a denial was sent.
    Denied,
    /// No keyword matched; a help pointer was sent.
    Unknown { token: String },
    /// A handler ran and its packaged result was sent.
    Executed {
        keyword: &'static str,
        success: bool,
    },
}

/// Dispatches inbound messages against the shared relay state.
#[derive(Clone)]
pub struct Dispatcher {
    state: Arc<RelayState>,
}

impl Dispatcher {
    pub fn new(state: Arc<RelayState>) -> Self {
        Self { state }
    }

    /// Handles one message end to end, including delivery of its response.
    pub async fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        let command_text = match gate::authorize(&self.state.principal, &message) {
            GateDecision::Ignored => {
                debug!(
                    "Ignoring non-command message #{} from {}",
                    message.arrival_order, message.sender_id
                );
                return DispatchOutcome::Ignored;
            }
            GateDecision::Denied => {
                warn!(
                    "Access denied for sender {} (message #{})",
                    message.sender_id, message.arrival_order
                );
                metrics::ACCESS_DENIED_TOTAL.inc();
                self.deliver(&message.sender_id, packager::access_denied())
                    .await;
                return DispatchOutcome::Denied;
            }
            GateDecision::Authorized(text) => text,
        };

        let command = match self.state.registry.resolve(command_text) {
            Resolution::Found(command) => command,
            Resolution::NotFound { token, suggestions } => {
                info!("Unrecognized command '{}' from principal", token);
                self.deliver(
                    &message.sender_id,
                    packager::unknown_command(&token, &suggestions),
                )
                .await;
                return DispatchOutcome::Unknown { token };
            }
        };

        let span = info_span!(
            "command",
            name = %command.keyword,
            sender = %message.sender_id,
            order = message.arrival_order,
        );
        self.execute(command, &message).instrument(span).await
    }

    async fn execute(&self, command: &Command, message: &InboundMessage) -> DispatchOutcome {
        let keyword = command.keyword;
        let start_time = Instant::now();
        metrics::COMMANDS_DISPATCHED_TOTAL
            .with_label_values(&[keyword])
            .inc();
        info!("Dispatching /{} ({})", keyword, command.kind);

        let activity = match command.kind {
            CommandKind::Probe => None,
            CommandKind::LogRetrieval => Some(Activity::UploadingDocument),
            CommandKind::MutatingPipeline => Some(Activity::Typing),
        };
        if let Some(activity) = activity
            && let Err(e) = self
                .state
                .transport
                .send_activity(&message.sender_id, activity)
                .await
        {
            debug!("Activity hint for /{} not delivered: {}", keyword, e);
        }

        let ctx = ActionContext {
            state: self.state.clone(),
            request_id: message.arrival_order,
            keyword,
        };
        let handler = command.handler.clone();
        // The handler runs on its own task so a panic surfaces as a JoinError.
        let joined = tokio::spawn(async move { handler.run(&ctx).await }).await;

        let (outbound, success) = match joined {
            Ok(result) => {
                let success = result.success;
                if !success {
                    log_failure(keyword, &result);
                }
                (packager::package(result), success)
            }
            Err(e) => {
                error!("Handler for /{} crashed: {}", keyword, e);
                (packager::internal_failure(keyword), false)
            }
        };

        metrics::COMMAND_LATENCY_SECONDS
            .with_label_values(&[keyword])
            .observe(start_time.elapsed().as_secs_f64());
        if !success {
            metrics::COMMAND_FAILURES_TOTAL
                .with_label_values(&[keyword])
                .inc();
        }

        self.deliver(&message.sender_id, outbound).await;
        DispatchOutcome::Executed { keyword, success }
    }

    /// Sends `outbound` to `recipient`. Failures are logged and counted, never propagated.
    async fn deliver(&self, recipient: &str, outbound: OutboundMessage) {
        let transport = &self.state.transport;
        match outbound {
            OutboundMessage::Text { text, format } => {
                if let Err(e) = transport.send_text(recipient, &text, format).await {
                    error!("Failed to deliver response to {}: {}", recipient, e);
                    metrics::DELIVERY_FAILURES_TOTAL.inc();
                }
            }
            OutboundMessage::File {
                path,
                caption,
                transient,
            } => {
                if let Err(e) = transport.send_file(recipient, &path, &caption).await {
                    error!(
                        "Failed to deliver file {} to {}: {}",
                        path.display(),
                        recipient,
                        e
                    );
                    metrics::DELIVERY_FAILURES_TOTAL.inc();
                }
                if transient && let Err(e) = self.state.cleanup_tx.send(path).await {
                    // Cleaner already stopped; remove inline.
                    remove_transient(&e.0).await;
                }
            }
        }
    }
}

fn log_failure(keyword: &str, result: &ActionResult) {
    warn!(
        "/{} failed: {}: {}",
        keyword,
        result.headline,
        result.error.as_deref().unwrap_or("no detail")
    );
}
