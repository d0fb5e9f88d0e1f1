//! Steps that query the search tool.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{field_text, location_part, numbered_items};
use crate::errors::CareerflowError;
use crate::signal::ControlSignal;
use crate::state::{SharedState, StateField};
use crate::steps::{PipelineStep, StepToolkit};

/// `A2_StreamResearch`: looks up study streams matching the interest.
#[derive(Debug, Clone)]
pub struct StreamResearch {
    toolkit: StepToolkit,
}

impl StreamResearch {
    /// Creates the step.
    #[must_use]
    pub fn new(toolkit: StepToolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl PipelineStep for StreamResearch {
    fn name(&self) -> &str {
        "A2_StreamResearch"
    }

    fn requires(&self) -> &[StateField] {
        &[StateField::InterestArea]
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        let interest = field_text(state, StateField::InterestArea);
        let query = format!(
            "3 best high school and college educational streams for interest in {interest}"
        );
        let streams = self.toolkit.search(self.name(), &query).await?;

        state.update([("suggested_streams", json!(streams))]);
        info!(step = self.name(), streams = %streams, "Suggested streams");
        Ok(ControlSignal::AwaitExternalInput)
    }
}

/// `A4_CollegeSearch`: looks up colleges offering the chosen stream near
/// the user.
#[derive(Debug, Clone)]
pub struct CollegeSearch {
    toolkit: StepToolkit,
}

impl CollegeSearch {
    /// Creates the step.
    #[must_use]
    pub fn new(toolkit: StepToolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl PipelineStep for CollegeSearch {
    fn name(&self) -> &str {
        "A4_CollegeSearch"
    }

    fn requires(&self) -> &[StateField] {
        &[StateField::TargetStream, StateField::UserLocation]
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        let stream = field_text(state, StateField::TargetStream);
        let query = format!(
            "Top 3 colleges in {}, {} for {stream} program",
            location_part(state, "city"),
            location_part(state, "state"),
        );
        let colleges = self.toolkit.search(self.name(), &query).await?;

        state.update([("college_results", json!(colleges))]);
        info!(step = self.name(), colleges = %colleges, "Found colleges");
        Ok(ControlSignal::Continue)
    }
}

/// `A5_CriteriaSearch`: looks up admission criteria, one query per college.
///
/// Any query that gives up fails the whole step; partial criteria are
/// never written.
#[derive(Debug, Clone)]
pub struct CriteriaSearch {
    toolkit: StepToolkit,
}

impl CriteriaSearch {
    /// Creates the step.
    #[must_use]
    pub fn new(toolkit: StepToolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl PipelineStep for CriteriaSearch {
    fn name(&self) -> &str {
        "A5_CriteriaSearch"
    }

    fn requires(&self) -> &[StateField] {
        &[StateField::CollegeResults, StateField::TargetStream]
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        let colleges = numbered_items(&field_text(state, StateField::CollegeResults));
        if colleges.is_empty() {
            return Err(CareerflowError::Validation(
                "college results list no colleges".to_string(),
            ));
        }

        let mut details = Vec::with_capacity(colleges.len());
        for college in &colleges {
            let query = format!("Admission criteria and process for {college}");
            details.push(self.toolkit.search(self.name(), &query).await?);
        }

        state.update([("criteria_details", json!(details.join(" ")))]);
        info!(step = self.name(), colleges = colleges.len(), "Admission criteria gathered");
        Ok(ControlSignal::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolFailure;
    use crate::retry::{RetryConfig, RetryPolicy};
    use crate::testing::ScriptedSearchTool;
    use std::sync::Arc;

    fn toolkit(tool: Arc<ScriptedSearchTool>) -> StepToolkit {
        StepToolkit::new(tool, RetryPolicy::new(RetryConfig::new().with_max_attempts(1)))
    }

    #[tokio::test]
    async fn test_stream_research_awaits_selection() {
        let tool = Arc::new(ScriptedSearchTool::always("1. Genetics"));
        let mut state = SharedState::new();
        state.set(StateField::InterestArea, json!("biology"));

        let step = StreamResearch::new(toolkit(tool.clone()));
        assert_eq!(step.execute(&mut state).await, ControlSignal::AwaitExternalInput);
        assert_eq!(state.get_str(StateField::SuggestedStreams), Some("1. Genetics"));
        assert_eq!(
            tool.queries(),
            vec!["3 best high school and college educational streams for interest in biology"]
        );
    }

    #[tokio::test]
    async fn test_stream_research_treats_null_interest_as_absent() {
        let tool = Arc::new(ScriptedSearchTool::always("1. Genetics"));
        let mut state = SharedState::new();
        state.set(StateField::InterestArea, serde_json::Value::Null);

        let step = StreamResearch::new(toolkit(tool.clone()));
        assert_eq!(step.execute(&mut state).await, ControlSignal::Error);
        assert_eq!(tool.call_count(), 0);
        assert!(!state.is_set(StateField::SuggestedStreams));
    }

    #[tokio::test]
    async fn test_college_search_query_uses_location() {
        let tool = Arc::new(ScriptedSearchTool::always("1. Somewhere U"));
        let mut state = SharedState::new();
        state.set(StateField::TargetStream, json!("Genetics"));
        state.set(StateField::UserLocation, json!({"state": "Oregon", "city": "Portland"}));

        let step = CollegeSearch::new(toolkit(tool.clone()));
        assert_eq!(step.execute(&mut state).await, ControlSignal::Continue);
        assert_eq!(
            tool.queries(),
            vec!["Top 3 colleges in Portland, Oregon for Genetics program"]
        );
    }

    #[tokio::test]
    async fn test_college_search_skips_without_location() {
        let tool = Arc::new(ScriptedSearchTool::always("unused"));
        let mut state = SharedState::new();
        state.set(StateField::TargetStream, json!("Genetics"));

        let step = CollegeSearch::new(toolkit(tool.clone()));
        assert_eq!(step.execute(&mut state).await, ControlSignal::Error);
        assert_eq!(tool.call_count(), 0);
    }

    #[tokio::test]
    async fn test_criteria_search_one_query_per_college() {
        let tool = Arc::new(
            ScriptedSearchTool::always("unused")
                .then(Ok("A: strict.".to_string()))
                .then(Ok("B: lenient.".to_string())),
        );
        let mut state = SharedState::new();
        state.set(StateField::TargetStream, json!("Genetics"));
        state.set(StateField::CollegeResults, json!("1. Alpha College, 2. Beta Institute."));

        let step = CriteriaSearch::new(toolkit(tool.clone()));
        assert_eq!(step.execute(&mut state).await, ControlSignal::Continue);
        assert_eq!(
            tool.queries(),
            vec![
                "Admission criteria and process for Alpha College",
                "Admission criteria and process for Beta Institute",
            ]
        );
        assert_eq!(
            state.get_str(StateField::CriteriaDetails),
            Some("A: strict. B: lenient.")
        );
    }

    #[tokio::test]
    async fn test_criteria_search_failure_writes_nothing() {
        let tool = Arc::new(
            ScriptedSearchTool::failing(ToolFailure::new(403, "forbidden"))
                .then(Ok("A: strict.".to_string())),
        );
        let mut state = SharedState::new();
        state.set(StateField::TargetStream, json!("Genetics"));
        state.set(StateField::CollegeResults, json!("1. Alpha College, 2. Beta Institute."));

        let step = CriteriaSearch::new(toolkit(tool.clone()));
        assert_eq!(step.execute(&mut state).await, ControlSignal::Error);
        assert_eq!(tool.call_count(), 2);
        assert!(!state.is_set(StateField::CriteriaDetails));
    }
}
