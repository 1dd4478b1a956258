// src/core/metrics.rs

//! Defines and registers Prometheus metrics for the relay.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, HistogramVec, TextEncoder, register_counter, register_counter_vec,
    register_gauge, register_histogram_vec,
};

lazy_static! {
    // --- Gauges ---
    /// The number of mutating pipelines currently holding their exclusion guard.
    pub static ref PIPELINES_IN_PROGRESS: Gauge =
        register_gauge!("opsrelay_pipelines_in_progress", "Number of mutating pipelines currently running.").unwrap();


    // --- Counters ---
    /// Text messages handed to the dispatcher by the transport.
    pub static ref MESSAGES_RECEIVED_TOTAL: Counter =
        register_counter!("opsrelay_messages_received_total", "Total number of inbound text messages.").unwrap();
    /// Commands resolved and executed, labeled by keyword.
    pub static ref COMMANDS_DISPATCHED_TOTAL: CounterVec =
        register_counter_vec!("opsrelay_commands_dispatched_total", "Total number of commands dispatched, labeled by command.", &["command"]).unwrap();
    /// Commands whose result was a failure, labeled by keyword.
    pub static ref COMMAND_FAILURES_TOTAL: CounterVec =
        register_counter_vec!("opsrelay_command_failures_total", "Total number of failed commands, labeled by command.", &["command"]).unwrap();
    /// Commands rejected because the sender is not the principal.
    pub static ref ACCESS_DENIED_TOTAL: Counter =
        register_counter!("opsrelay_access_denied_total", "Total number of commands rejected by the authorization gate.").unwrap();
    /// Outbound messages the transport failed to deliver.
    pub static ref DELIVERY_FAILURES_TOTAL: Counter =
        register_counter!("opsrelay_delivery_failures_total", "Total number of responses that could not be delivered.").unwrap();


    // --- Histograms ---
    /// Time from dispatch to packaged result, labeled by keyword.
    pub static ref COMMAND_LATENCY_SECONDS: HistogramVec =
        register_histogram_vec!("opsrelay_command_latency_seconds", "Latency of command execution in seconds, labeled by command.", &["command"]).unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
