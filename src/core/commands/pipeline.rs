// src/core/commands/pipeline.rs

//! Sequential multi-step pipelines for mutating commands.
//!
//! Steps run strictly in order, each awaited before the next starts. The first
//! failing step aborts the rest. A pipeline holds its [`PipelineGuard`] for the
//! whole run, so a second invocation of the same pipeline is refused before any
//! of its processes are spawned. A step may also hold another pipeline's guard
//! while it runs, which keeps a shared script from running twice at once.

use super::command_trait::ActionResult;
use crate::core::RelayError;
use crate::core::process::{ProcessOutput, ProcessSpec};
use crate::core::state::RelayState;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Lines of script output kept in a successful pipeline report.
const REPORT_TAIL_LINES: usize = 15;

/// One external command in a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineStep {
    pub name: &'static str,
    pub process: ProcessSpec,
    pub timeout: Duration,
    /// Shown to the operator if this step fails.
    pub on_failure: String,
    /// Another pipeline whose guard this step holds while it runs.
    pub shares_guard_with: Option<&'static str>,
}

/// A completed step, kept for the final report.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: &'static str,
    pub elapsed: Duration,
    pub output: ProcessOutput,
}

/// How a pipeline run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(Vec<StepReport>),
    Failed {
        /// 1-based position of the failing step.
        step_number: usize,
        total_steps: usize,
        step_name: &'static str,
        message: String,
        error: RelayError,
    },
    /// The guard of pipeline `id` is held by another run.
    Busy { id: &'static str },
}

/// An ordered list of steps identified by a pipeline id.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub id: &'static str,
    pub steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Runs every step in order under the pipeline's exclusive guard.
    pub async fn run(&self, state: &RelayState) -> PipelineOutcome {
        let Some(_guard) = state.pipelines.try_acquire(self.id) else {
            warn!("Pipeline '{}' requested, but one is already in progress.", self.id);
            return PipelineOutcome::Busy { id: self.id };
        };

        let total_steps = self.steps.len();
        let mut reports = Vec::with_capacity(total_steps);

        for (index, step) in self.steps.iter().enumerate() {
            info!(
                "Pipeline '{}' step {}/{} ({}): {}",
                self.id,
                index + 1,
                total_steps,
                step.name,
                step.process
            );
            let _shared_guard = match step.shares_guard_with {
                Some(other) => match state.pipelines.try_acquire(other) {
                    Some(guard) => Some(guard),
                    None => {
                        warn!(
                            "Pipeline '{}' step {} ({}) blocked: '{}' is in progress.",
                            self.id,
                            index + 1,
                            step.name,
                            other
                        );
                        return PipelineOutcome::Busy { id: other };
                    }
                },
                None => None,
            };
            let started = Instant::now();
            match state.runner.run_checked(&step.process, step.timeout).await {
                Ok(output) => reports.push(StepReport {
                    name: step.name,
                    elapsed: started.elapsed(),
                    output,
                }),
                Err(e) => {
                    error!(
                        "Pipeline '{}' aborted at step {} ({}): {}",
                        self.id,
                        index + 1,
                        step.name,
                        e
                    );
                    return PipelineOutcome::Failed {
                        step_number: index + 1,
                        total_steps,
                        step_name: step.name,
                        message: step.on_failure.clone(),
                        error: e,
                    };
                }
            }
        }

        info!("Pipeline '{}' completed {} step(s).", self.id, total_steps);
        PipelineOutcome::Completed(reports)
    }
}

impl PipelineOutcome {
    /// Renders the outcome as the single result for the operator.
    pub fn into_result(self, success_headline: &str, busy_headline: &str) -> ActionResult {
        match self {
            PipelineOutcome::Completed(reports) => {
                let body = reports
                    .iter()
                    .map(render_report)
                    .collect::<Vec<_>>()
                    .join("\n\n");
                ActionResult::ok(success_headline, body)
            }
            PipelineOutcome::Failed {
                step_number,
                total_steps,
                step_name,
                message,
                error,
            } => ActionResult::failed(
                format!("{message} (step {step_number}/{total_steps}: {step_name})"),
                error.to_string(),
            ),
            PipelineOutcome::Busy { id } => ActionResult::failed(
                busy_headline,
                format!(
                    "{}. Wait for it to finish and try again.",
                    RelayError::PipelineBusy(id.to_string())
                ),
            ),
        }
    }
}

fn render_report(report: &StepReport) -> String {
    let mut text = format!("[{}] done in {}s", report.name, report.elapsed.as_secs());
    let tail = tail_lines(&report.output.stdout, REPORT_TAIL_LINES);
    if !tail.is_empty() {
        text.push('\n');
        text.push_str(&tail);
    }
    text
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
