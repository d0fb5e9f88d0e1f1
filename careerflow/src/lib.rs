//! # Careerflow
//!
//! A sequential pipeline orchestrator with bounded retries for external
//! calls, plus the career-builder pipeline built on it.
//!
//! Careerflow provides:
//!
//! - **Shared state**: a closed set of named fields that steps read and write
//! - **Control signals**: each step tells the orchestrator to advance or halt
//! - **Fault containment**: a panicking step halts the run instead of the process
//! - **Retries**: exponential backoff around search calls, classified by code
//! - **Event sinks**: structured diagnostics passed explicitly to every component
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use careerflow::prelude::*;
//!
//! let pipeline = Orchestrator::builder("hello")
//!     .step(FnStep::new("greet", |state| {
//!         state.update([("final_summary", serde_json::json!("hi"))]);
//!         Ok(ControlSignal::Complete)
//!     }))
//!     .build()?;
//!
//! let summary = pipeline.run().await.into_result()?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod career;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod orchestrator;
pub mod retry;
pub mod signal;
pub mod state;
pub mod steps;
pub mod testing;
pub mod tools;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{FlowConfig, LoggingConfig, SearchConfig, UserProfile};
    pub use crate::errors::{
        CareerflowError, FatalExternalError, MissingPreconditionError, ToolFailure,
        UnknownStateKeyError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::orchestrator::{Orchestrator, OrchestratorBuilder, RunOutcome, RunState};
    pub use crate::retry::{RetryConfig, RetryPolicy};
    pub use crate::signal::ControlSignal;
    pub use crate::state::{SharedState, StateField, StateUpdate};
    pub use crate::steps::{FnStep, PipelineStep, StepToolkit};
    pub use crate::tools::{CannedSearchTool, SearchTool};
}
