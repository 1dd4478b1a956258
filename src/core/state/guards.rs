// src/core/state/guards.rs

//! Defines `PipelineGuard`, an RAII guard giving one caller exclusive use of a pipeline.

use crate::core::metrics;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// One in-progress flag per pipeline identity.
#[derive(Default)]
pub struct PipelineGuards {
    flags: DashMap<&'static str, Arc<AtomicBool>>,
}

impl PipelineGuards {
    /// Claims the pipeline `id`, or returns `None` if a run is already in flight.
    pub fn try_acquire(&self, id: &'static str) -> Option<PipelineGuard> {
        let flag = self.flags.entry(id).or_default().clone();
        // `compare_exchange` ensures only one task can move the flag to `true`.
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        metrics::PIPELINES_IN_PROGRESS.inc();
        debug!("Pipeline '{}' acquired.", id);
        Some(PipelineGuard { id, flag })
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.flags
            .get(id)
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Releases the pipeline when dropped, whatever the outcome of the run.
pub struct PipelineGuard {
    id: &'static str,
    flag: Arc<AtomicBool>,
}

impl Drop for PipelineGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        metrics::PIPELINES_IN_PROGRESS.dec();
        debug!("Pipeline '{}' released.", self.id);
    }
}
