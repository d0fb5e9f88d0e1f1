//! Collaborators shared by steps.

use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::errors::CareerflowError;
use crate::events::{EventSink, NoOpEventSink};
use crate::retry::RetryPolicy;
use crate::tools::SearchTool;

/// Read-only handles a step uses for external work and diagnostics.
#[derive(Clone)]
pub struct StepToolkit {
    search: Arc<dyn SearchTool>,
    retry: RetryPolicy,
    event_sink: Arc<dyn EventSink>,
}

impl fmt::Debug for StepToolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepToolkit")
            .field("retry", self.retry.config())
            .finish_non_exhaustive()
    }
}

impl StepToolkit {
    /// Creates a toolkit with the given search tool and retry policy.
    #[must_use]
    pub fn new(search: Arc<dyn SearchTool>, retry: RetryPolicy) -> Self {
        Self {
            search,
            retry,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink, also passing it to the retry policy.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.retry = self.retry.with_event_sink(sink.clone());
        self.event_sink = sink;
        self
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Runs one search query under the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`CareerflowError::FatalExternal`] when the search gives up.
    pub async fn search(&self, step: &str, query: &str) -> Result<String, CareerflowError> {
        info!(step, query, "Issuing search");
        self.event_sink.emit(
            "search.issued",
            Some(serde_json::json!({ "step": step, "query": query })),
        );

        let tool = &self.search;
        let operation = format!("{step}.search");
        self.retry
            .execute_with_retry(&operation, move || tool.search(query))
            .await
    }
}
