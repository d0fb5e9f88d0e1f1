//! Sequential pipeline execution.
//!
//! An [`Orchestrator`] runs its steps one after another against a single
//! [`SharedState`], interpreting each [`ControlSignal`] through
//! [`RunState`]. Every step executes inside a fault boundary: a panic is
//! caught, logged, and turned into a halt instead of unwinding through the
//! caller.

mod builder;
mod outcome;

pub use builder::OrchestratorBuilder;
pub use outcome::{RunOutcome, RunState};

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::CareerflowError;
use crate::events::EventSink;
use crate::signal::ControlSignal;
use crate::state::SharedState;
use crate::steps::PipelineStep;

/// Drives an ordered sequence of steps to a halt.
#[derive(Clone)]
pub struct Orchestrator {
    name: String,
    steps: Vec<Arc<dyn PipelineStep>>,
    event_sink: Arc<dyn EventSink>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Starts building an orchestrator.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(name)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the pipeline has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs the pipeline against a fresh, empty state.
    pub async fn run(&self) -> RunOutcome {
        let state = SharedState::new().with_event_sink(self.event_sink.clone());
        self.run_with_state(state).await
    }

    /// Runs the pipeline against the given state.
    ///
    /// Never fails: step errors and panics end the run in
    /// [`RunState::HaltedError`].
    pub async fn run_with_state(&self, state: SharedState) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", pipeline = %self.name, %run_id);
        self.drive(run_id, state).instrument(span).await
    }

    async fn drive(&self, run_id: Uuid, mut state: SharedState) -> RunOutcome {
        let started_at = Utc::now();
        let start = Instant::now();
        let len = self.steps.len();

        info!(steps = len, "Pipeline started");
        self.event_sink.emit(
            "pipeline.started",
            Some(serde_json::json!({
                "pipeline": self.name,
                "run_id": run_id.to_string(),
                "steps": self.step_names(),
            })),
        );

        let mut run_state = RunState::Running(0);
        let mut executed = Vec::with_capacity(len);
        let mut halted_at = None;
        let mut fault = None;

        while let RunState::Running(cursor) = run_state.bounded(len) {
            let step = &self.steps[cursor];
            let name = step.name().to_string();
            executed.push(name.clone());

            info!(step = %name, index = cursor, "Step started");
            self.event_sink.emit(
                "step.started",
                Some(serde_json::json!({ "step": name, "index": cursor })),
            );

            let step_start = Instant::now();
            let result = AssertUnwindSafe(step.execute(&mut state))
                .catch_unwind()
                .await;
            let duration_ms = step_start.elapsed().as_secs_f64() * 1000.0;

            match result {
                Ok(signal) => {
                    info!(step = %name, %signal, duration_ms, "Step finished");
                    self.event_sink.emit(
                        "step.completed",
                        Some(serde_json::json!({
                            "step": name,
                            "signal": signal,
                            "duration_ms": duration_ms,
                        })),
                    );
                    run_state = run_state.on_signal(signal);
                    if signal.is_halt() {
                        halted_at = Some(name);
                    }
                }
                Err(payload) => {
                    let err = CareerflowError::unexpected_fault(&name, panic_message(&*payload));
                    error!(
                        step = %name,
                        severity = "critical",
                        error = %err,
                        "Unexpected fault, halting pipeline"
                    );
                    self.event_sink.emit(
                        "step.fault",
                        Some(serde_json::json!({ "step": name, "error": err.to_dict() })),
                    );
                    run_state = RunState::HaltedError;
                    halted_at = Some(name);
                    fault = Some(err);
                }
            }
        }

        let status = run_state.bounded(len);
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        let data = serde_json::json!({
            "pipeline": self.name,
            "run_id": run_id.to_string(),
            "status": status,
            "executed": executed,
            "halted_at": halted_at,
            "duration_ms": duration_ms,
        });
        if status == RunState::HaltedSuccess {
            info!(%status, duration_ms, "Pipeline completed");
            self.event_sink.emit("pipeline.completed", Some(data));
        } else {
            error!(%status, halted_at = ?halted_at, duration_ms, "Pipeline halted on error");
            self.event_sink.emit("pipeline.failed", Some(data));
        }

        RunOutcome {
            run_id,
            pipeline: self.name.clone(),
            status,
            executed,
            halted_at,
            fault,
            state,
            started_at,
            ended_at: Utc::now(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "step panicked with a non-string payload".to_string()
    }
}
