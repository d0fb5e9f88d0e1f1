//! Review and reporting steps.

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use super::{field_text, location_part, numbered_items};
use crate::errors::CareerflowError;
use crate::signal::ControlSignal;
use crate::state::{SharedState, StateField};
use crate::steps::PipelineStep;

const RESEARCH_FIELDS: [StateField; 6] = [
    StateField::InterestArea,
    StateField::SuggestedStreams,
    StateField::UserLocation,
    StateField::TargetStream,
    StateField::CollegeResults,
    StateField::CriteriaDetails,
];

const REPORT_FIELDS: [StateField; 7] = [
    StateField::InterestArea,
    StateField::SuggestedStreams,
    StateField::UserLocation,
    StateField::TargetStream,
    StateField::CollegeResults,
    StateField::CriteriaDetails,
    StateField::ReviewerNotes,
];

const EXPECTED_COLLEGES: usize = 3;

/// `A6_Reviewer`: cross-checks the research results for consistency.
///
/// Findings are recorded in `reviewer_notes`; they never fail the step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reviewer;

impl Reviewer {
    /// Returns the consistency findings for the collected research.
    #[must_use]
    pub fn findings(state: &SharedState) -> Vec<String> {
        let mut findings = Vec::new();

        let stream = field_text(state, StateField::TargetStream);
        let suggestions = field_text(state, StateField::SuggestedStreams);
        if !contains_ci(&suggestions, &stream) {
            findings.push(format!(
                "The selected stream '{stream}' is not among the suggested streams."
            ));
        }

        let city = location_part(state, "city");
        let region = location_part(state, "state");
        if city.is_empty() || region.is_empty() {
            findings.push("The target location is incomplete.".to_string());
        }

        let colleges = numbered_items(&field_text(state, StateField::CollegeResults));
        if colleges.len() < EXPECTED_COLLEGES {
            findings.push(format!(
                "Only {} college option(s) were found, expected {EXPECTED_COLLEGES}.",
                colleges.len()
            ));
        }

        let criteria = field_text(state, StateField::CriteriaDetails);
        if criteria.trim().is_empty() {
            findings.push("No admission criteria were gathered.".to_string());
        }

        findings
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl PipelineStep for Reviewer {
    fn name(&self) -> &str {
        "A6_Reviewer"
    }

    fn requires(&self) -> &[StateField] {
        &RESEARCH_FIELDS
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        let findings = Self::findings(state);
        let notes = if findings.is_empty() {
            format!(
                "All data appears consistent. The suggested streams align with '{}'. \
                 College names are matched to the location and target stream. \
                 Admission criteria were gathered for every listed college.",
                field_text(state, StateField::InterestArea)
            )
        } else {
            warn!(step = self.name(), issues = findings.len(), "Review found issues");
            format!(
                "Review found {} issue(s): {}",
                findings.len(),
                findings.join(" ")
            )
        };

        state.update([("reviewer_notes", json!(notes))]);
        info!(step = self.name(), "Reviewer completed analysis");
        Ok(ControlSignal::Continue)
    }
}

/// `A7_Summary`: composes the final report and completes the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Summary;

impl Summary {
    /// Renders the report from a fully populated state.
    #[must_use]
    pub fn render(state: &SharedState) -> String {
        let stream = field_text(state, StateField::TargetStream);
        format!(
            "\n--- Career Builder Helper Summary ---\n\n\
             **User Interest:** {interest}\n\n\
             **Selected Stream:** {stream} (from the initial suggestions: {suggestions})\n\n\
             **Target Location:** {city}, {region}\n\n\
             **Top 3 College Options for {stream}:**\n{colleges}\n\n\
             **Admission Criteria & Process Overview:**\n{criteria}\n\n\
             **Reviewer Note (Validation):**\n{notes}\n\n\
             This detailed plan provides a robust starting point for your education journey.\n",
            interest = field_text(state, StateField::InterestArea),
            suggestions = field_text(state, StateField::SuggestedStreams),
            city = location_part(state, "city"),
            region = location_part(state, "state"),
            colleges = field_text(state, StateField::CollegeResults),
            criteria = field_text(state, StateField::CriteriaDetails),
            notes = field_text(state, StateField::ReviewerNotes),
        )
    }
}

#[async_trait]
impl PipelineStep for Summary {
    fn name(&self) -> &str {
        "A7_Summary"
    }

    fn requires(&self) -> &[StateField] {
        &REPORT_FIELDS
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        let summary = Self::render(state);
        state.update([("final_summary", json!(summary))]);
        info!(step = self.name(), "Final summary generated");
        Ok(ControlSignal::Complete)
    }
}
