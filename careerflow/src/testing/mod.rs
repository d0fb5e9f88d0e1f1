//! Testing utilities for careerflow pipelines.
//!
//! This module provides:
//! - Steps with fixed signals, writes, or panics
//! - A scripted search tool
//! - Assertions for run outcomes

mod assertions;
mod mocks;

pub use assertions::{
    assert_executed, assert_halted_error, assert_halted_success, assert_state_has,
};
pub use mocks::{PanickingStep, ScriptedSearchTool, SignalStep};
