//! Step control signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome a step reports to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlSignal {
    /// Proceed to the next step.
    Continue,
    /// Proceed to the next step. Nothing suspends; the name marks steps
    /// whose successor would consume user input.
    AwaitExternalInput,
    /// Halt the pipeline and report failure.
    Error,
    /// Halt the pipeline and report success.
    Complete,
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "CONTINUE"),
            Self::AwaitExternalInput => write!(f, "AWAIT_EXTERNAL_INPUT"),
            Self::Error => write!(f, "ERROR"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

impl ControlSignal {
    /// Returns true if the orchestrator moves on to the next step.
    #[must_use]
    pub fn advances(&self) -> bool {
        matches!(self, Self::Continue | Self::AwaitExternalInput)
    }

    /// Returns true if the signal halts the pipeline.
    #[must_use]
    pub fn is_halt(&self) -> bool {
        !self.advances()
    }
}
