//! Run states and the result of a pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::CareerflowError;
use crate::signal::ControlSignal;
use crate::state::{SharedState, StateField};

/// The orchestrator's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Executing; the cursor indexes the next step.
    Running(usize),
    /// Halted after a `COMPLETE` signal or running past the last step.
    HaltedSuccess,
    /// Halted after an `ERROR` signal or a fault.
    HaltedError,
}

impl RunState {
    /// Applies a step's signal to a running state.
    ///
    /// Halted states are absorbing.
    #[must_use]
    pub fn on_signal(self, signal: ControlSignal) -> Self {
        match self {
            Self::Running(cursor) => match signal {
                ControlSignal::Complete => Self::HaltedSuccess,
                ControlSignal::Error => Self::HaltedError,
                ControlSignal::Continue | ControlSignal::AwaitExternalInput => {
                    Self::Running(cursor + 1)
                }
            },
            halted => halted,
        }
    }

    /// Halts a cursor that ran past a sequence of `len` steps.
    #[must_use]
    pub fn bounded(self, len: usize) -> Self {
        match self {
            Self::Running(cursor) if cursor >= len => Self::HaltedSuccess,
            other => other,
        }
    }

    /// Returns true once the machine has halted.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        !matches!(self, Self::Running(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running(cursor) => write!(f, "running({cursor})"),
            Self::HaltedSuccess => write!(f, "halted_success"),
            Self::HaltedError => write!(f, "halted_error"),
        }
    }
}

/// The result of one pipeline run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Run identifier.
    pub run_id: Uuid,
    /// Pipeline name.
    pub pipeline: String,
    /// Final machine state. Always halted.
    pub status: RunState,
    /// Names of the steps that were executed, in order.
    pub executed: Vec<String>,
    /// The step whose signal or fault halted the run.
    pub halted_at: Option<String>,
    /// The fault caught at the fault boundary, if any.
    pub fault: Option<CareerflowError>,
    /// The state as the run left it.
    pub state: SharedState,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run halted.
    pub ended_at: DateTime<Utc>,
}

impl RunOutcome {
    /// Returns true if the run halted successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunState::HaltedSuccess
    }

    /// Returns the final summary. Only a successful run exposes one.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        if self.is_success() {
            self.state.get_str(StateField::FinalSummary)
        } else {
            None
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Converts the outcome into the summary or the reason there is none.
    ///
    /// # Errors
    ///
    /// Returns the caught fault, or [`CareerflowError::Aborted`] when the run
    /// halted on an error signal or finished without a summary.
    pub fn into_result(self) -> Result<String, CareerflowError> {
        if let Some(summary) = self.summary() {
            return Ok(summary.to_string());
        }
        if let Some(fault) = self.fault {
            return Err(fault);
        }
        let reason = match (self.status, self.halted_at) {
            (RunState::HaltedError, Some(step)) => format!("step '{step}' reported an error"),
            (RunState::HaltedError, None) => "pipeline halted on error".to_string(),
            _ => "pipeline finished without a final summary".to_string(),
        };
        Err(CareerflowError::Aborted(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(status: RunState, state: SharedState) -> RunOutcome {
        RunOutcome {
            run_id: Uuid::new_v4(),
            pipeline: "test".to_string(),
            status,
            executed: vec!["a".to_string()],
            halted_at: Some("a".to_string()),
            fault: None,
            state,
            started_at: Utc::now(),
            ended_at: Utc::now(),
        }
    }

    #[test]
    fn test_transitions() {
        let running = RunState::Running(2);
        assert_eq!(running.on_signal(ControlSignal::Continue), RunState::Running(3));
        assert_eq!(running.on_signal(ControlSignal::AwaitExternalInput), RunState::Running(3));
        assert_eq!(running.on_signal(ControlSignal::Complete), RunState::HaltedSuccess);
        assert_eq!(running.on_signal(ControlSignal::Error), RunState::HaltedError);
    }

    #[test]
    fn test_halted_states_absorb() {
        assert_eq!(
            RunState::HaltedError.on_signal(ControlSignal::Continue),
            RunState::HaltedError
        );
        assert_eq!(
            RunState::HaltedSuccess.on_signal(ControlSignal::Error),
            RunState::HaltedSuccess
        );
    }

    #[test]
    fn test_bounded() {
        assert_eq!(RunState::Running(3).bounded(3), RunState::HaltedSuccess);
        assert_eq!(RunState::Running(0).bounded(0), RunState::HaltedSuccess);
        assert_eq!(RunState::Running(1).bounded(3), RunState::Running(1));
        assert!(!RunState::Running(1).is_halted());
    }

    #[test]
    fn test_summary_only_on_success() {
        let mut state = SharedState::new();
        state.set(StateField::FinalSummary, json!("done"));

        let ok = outcome(RunState::HaltedSuccess, state.clone());
        assert_eq!(ok.summary(), Some("done"));
        assert_eq!(ok.into_result().unwrap(), "done");

        let failed = outcome(RunState::HaltedError, state);
        assert_eq!(failed.summary(), None);
        let err = failed.into_result().unwrap_err();
        assert!(matches!(err, CareerflowError::Aborted(ref r) if r.contains("'a'")));
    }

    #[test]
    fn test_success_without_summary_is_aborted() {
        let err = outcome(RunState::HaltedSuccess, SharedState::new())
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind(), "aborted");
    }

    #[test]
    fn test_display() {
        assert_eq!(RunState::Running(4).to_string(), "running(4)");
        assert_eq!(RunState::HaltedError.to_string(), "halted_error");
    }
}
