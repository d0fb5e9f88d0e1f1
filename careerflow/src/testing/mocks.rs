//! Mock steps and tools for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::errors::{CareerflowError, ToolFailure};
use crate::signal::ControlSignal;
use crate::state::{SharedState, StateField};
use crate::steps::PipelineStep;
use crate::tools::SearchTool;

/// A step that writes fixed values and returns a fixed signal.
#[derive(Debug)]
pub struct SignalStep {
    name: String,
    signal: ControlSignal,
    requires: Vec<StateField>,
    writes: Vec<(String, serde_json::Value)>,
    call_count: Mutex<usize>,
}

impl SignalStep {
    /// Creates a step returning `signal`.
    #[must_use]
    pub fn new(name: impl Into<String>, signal: ControlSignal) -> Self {
        Self {
            name: name.into(),
            signal,
            requires: Vec::new(),
            writes: Vec::new(),
            call_count: Mutex::new(0),
        }
    }

    /// Shorthand for a step returning [`ControlSignal::Continue`].
    #[must_use]
    pub fn continuing(name: impl Into<String>) -> Self {
        Self::new(name, ControlSignal::Continue)
    }

    /// Adds a named write applied through [`SharedState::update`] on each run.
    #[must_use]
    pub fn writing(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.writes.push((key.into(), value));
        self
    }

    /// Declares a required field.
    #[must_use]
    pub fn requiring(mut self, field: StateField) -> Self {
        self.requires.push(field);
        self
    }

    /// Returns the number of times `run` was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[async_trait]
impl PipelineStep for SignalStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> &[StateField] {
        &self.requires
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        *self.call_count.lock() += 1;
        if !self.writes.is_empty() {
            state.update(self.writes.iter().cloned());
        }
        Ok(self.signal)
    }
}

/// A step that panics when run.
#[derive(Debug)]
pub struct PanickingStep {
    name: String,
    message: String,
}

impl PanickingStep {
    /// Creates a step that panics with `message`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl PipelineStep for PanickingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        panic!("{}", self.message);
    }
}

/// A search tool replaying a queue of results.
///
/// Each call pops the next scripted result; once the queue is empty the
/// fallback result is returned. Every query is recorded.
#[derive(Debug)]
pub struct ScriptedSearchTool {
    script: Mutex<VecDeque<Result<String, ToolFailure>>>,
    fallback: Result<String, ToolFailure>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearchTool {
    /// Creates a tool whose calls fall back to `fallback` once the script
    /// runs out.
    #[must_use]
    pub fn new(fallback: Result<String, ToolFailure>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A tool that always answers `response`.
    #[must_use]
    pub fn always(response: impl Into<String>) -> Self {
        Self::new(Ok(response.into()))
    }

    /// A tool that always fails with `failure`.
    #[must_use]
    pub fn failing(failure: ToolFailure) -> Self {
        Self::new(Err(failure))
    }

    /// Queues a result ahead of the fallback.
    #[must_use]
    pub fn then(self, result: Result<String, ToolFailure>) -> Self {
        self.script.lock().push_back(result);
        self
    }

    /// Returns the queries received so far.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl SearchTool for ScriptedSearchTool {
    async fn search(&self, query: &str) -> Result<String, ToolFailure> {
        self.queries.lock().push(query.to_string());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_signal_step_counts_and_writes() {
        let step = SignalStep::continuing("w").writing("interest_area", json!("X"));
        let mut state = SharedState::new();

        assert_eq!(step.execute(&mut state).await, ControlSignal::Continue);
        assert_eq!(step.call_count(), 1);
        assert_eq!(state.get_str(StateField::InterestArea), Some("X"));
    }

    #[tokio::test]
    async fn test_scripted_tool_replays_then_falls_back() {
        let tool = ScriptedSearchTool::always("steady")
            .then(Err(ToolFailure::unavailable("down")))
            .then(Ok("first".to_string()));

        assert_eq!(tool.search("q1").await.unwrap_err().code, 503);
        assert_eq!(tool.search("q2").await.unwrap(), "first");
        assert_eq!(tool.search("q3").await.unwrap(), "steady");
        assert_eq!(tool.queries(), vec!["q1", "q2", "q3"]);
    }
}
