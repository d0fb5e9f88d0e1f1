//! Test assertions for run outcomes.

use crate::orchestrator::{RunOutcome, RunState};
use crate::state::StateField;

/// Asserts that the run halted successfully.
pub fn assert_halted_success(outcome: &RunOutcome) {
    assert_eq!(
        outcome.status,
        RunState::HaltedSuccess,
        "Expected success, halted at {:?} with fault {:?}",
        outcome.halted_at,
        outcome.fault
    );
}

/// Asserts that the run halted on error.
pub fn assert_halted_error(outcome: &RunOutcome) {
    assert_eq!(
        outcome.status,
        RunState::HaltedError,
        "Expected error halt, executed {:?}",
        outcome.executed
    );
}

/// Asserts that exactly the given steps were executed, in order.
pub fn assert_executed(outcome: &RunOutcome, expected: &[&str]) {
    let executed: Vec<&str> = outcome.executed.iter().map(String::as_str).collect();
    assert_eq!(executed, expected, "Unexpected execution order");
}

/// Asserts that a field is set in the final state.
pub fn assert_state_has(outcome: &RunOutcome, field: StateField) {
    assert!(
        outcome.state.is_set(field),
        "Expected state to contain '{}'. Populated: {:?}",
        field,
        outcome.state.populated_fields()
    );
}
