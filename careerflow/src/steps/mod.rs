//! Pipeline step trait and helpers.
//!
//! Steps are the units of work an [`Orchestrator`](crate::orchestrator::Orchestrator)
//! runs in order. A step implements [`PipelineStep::run`]; the provided
//! [`PipelineStep::execute`] adds the uniform contract around it: required
//! fields are checked first and every error becomes
//! [`ControlSignal::Error`].

mod toolkit;

pub use toolkit::StepToolkit;

use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{debug, error};

use crate::errors::{CareerflowError, MissingPreconditionError};
use crate::signal::ControlSignal;
use crate::state::{SharedState, StateField};

/// A unit of work in a pipeline.
#[async_trait]
pub trait PipelineStep: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// Fields that must be set before the step may run.
    fn requires(&self) -> &[StateField] {
        &[]
    }

    /// Performs the step's work.
    ///
    /// Called only when every field in [`requires`](Self::requires) is set.
    /// Produced fields should be written with [`SharedState::update`].
    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError>;

    /// Runs the step under the step contract.
    ///
    /// Returns [`ControlSignal::Error`] without calling `run` when a
    /// required field is absent, and converts any error from `run` into
    /// [`ControlSignal::Error`].
    async fn execute(&self, state: &mut SharedState) -> ControlSignal {
        let missing = state.missing(self.requires());
        if !missing.is_empty() {
            let err = MissingPreconditionError::new(
                self.name(),
                missing.iter().map(|f| f.as_str().to_string()).collect(),
            );
            error!(step = self.name(), error = %err, "Required state missing, step not run");
            return ControlSignal::Error;
        }

        match self.run(state).await {
            Ok(signal) => {
                debug!(step = self.name(), %signal, "Step returned");
                signal
            }
            Err(err) => {
                error!(step = self.name(), kind = err.kind(), error = %err, "Step failed");
                ControlSignal::Error
            }
        }
    }
}

type StepFn = dyn Fn(&mut SharedState) -> Result<ControlSignal, CareerflowError> + Send + Sync;

/// A step built from a closure.
pub struct FnStep {
    name: String,
    requires: Vec<StateField>,
    func: Box<StepFn>,
}

impl FnStep {
    /// Creates a new function-based step.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut SharedState) -> Result<ControlSignal, CareerflowError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            requires: Vec::new(),
            func: Box::new(func),
        }
    }

    /// Declares the fields this step requires.
    #[must_use]
    pub fn requiring(mut self, fields: impl IntoIterator<Item = StateField>) -> Self {
        self.requires = fields.into_iter().collect();
        self
    }
}

impl Debug for FnStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PipelineStep for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> &[StateField] {
        &self.requires
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        (self.func)(state)
    }
}
