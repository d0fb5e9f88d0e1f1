//! Orchestrator builder with validation.

use std::collections::HashSet;
use std::sync::Arc;

use super::Orchestrator;
use crate::errors::CareerflowError;
use crate::events::{EventSink, NoOpEventSink};
use crate::steps::PipelineStep;

/// Builder for creating validated orchestrators.
#[derive(Debug)]
pub struct OrchestratorBuilder {
    name: String,
    steps: Vec<Arc<dyn PipelineStep>>,
    event_sink: Arc<dyn EventSink>,
}

impl OrchestratorBuilder {
    /// Creates a new builder for a pipeline with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn step(self, step: impl PipelineStep + 'static) -> Self {
        self.shared_step(Arc::new(step))
    }

    /// Appends a step that is already shared.
    #[must_use]
    pub fn shared_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Sets the event sink for the orchestrator and the state it creates.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the number of steps added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if no step has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is empty, a step name is
    /// empty, or two steps share a name.
    pub fn build(self) -> Result<Orchestrator, CareerflowError> {
        if self.name.trim().is_empty() {
            return Err(CareerflowError::Validation(
                "Pipeline name cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            let name = step.name();
            if name.trim().is_empty() {
                return Err(CareerflowError::Validation(format!(
                    "Pipeline '{}' contains a step with an empty name",
                    self.name
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(CareerflowError::Validation(format!(
                    "Duplicate step name '{name}' in pipeline '{}'",
                    self.name
                )));
            }
        }

        Ok(Orchestrator {
            name: self.name,
            steps: self.steps,
            event_sink: self.event_sink,
        })
    }
}
