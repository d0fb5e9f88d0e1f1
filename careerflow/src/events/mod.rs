//! Event sink system for observability.
//!
//! Sinks are passed explicitly to the orchestrator, its steps, and the
//! shared state; there is no process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};

use std::sync::Arc;

/// Returns a shared no-op sink.
#[must_use]
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpEventSink)
}
