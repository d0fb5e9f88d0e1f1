//! The career-builder pipeline.
//!
//! Seven steps take a user from an area of interest to a report of
//! suggested study streams, colleges near them, and admission criteria:
//!
//! | Step                 | Requires                                   | Produces                          |
//! |----------------------|--------------------------------------------|-----------------------------------|
//! | `A1_InterestCapture` |                                            | `interest_area`                   |
//! | `A2_StreamResearch`  | `interest_area`                            | `suggested_streams`               |
//! | `A3_LocationCapture` | `suggested_streams`                        | `user_location`, `target_stream`  |
//! | `A4_CollegeSearch`   | `target_stream`, `user_location`           | `college_results`                 |
//! | `A5_CriteriaSearch`  | `college_results`, `target_stream`         | `criteria_details`                |
//! | `A6_Reviewer`        | every research field                       | `reviewer_notes`                  |
//! | `A7_Summary`         | every field above                          | `final_summary`                   |
//!
//! User inputs come pre-resolved from a [`UserProfile`].

mod capture;
mod report;
mod research;

pub use capture::{InterestCapture, LocationCapture};
pub use report::{Reviewer, Summary};
pub use research::{CollegeSearch, CriteriaSearch, StreamResearch};

use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::config::{FlowConfig, UserProfile};
use crate::errors::CareerflowError;
use crate::events::EventSink;
use crate::orchestrator::Orchestrator;
use crate::retry::RetryPolicy;
use crate::state::{SharedState, StateField};
use crate::steps::StepToolkit;
use crate::tools::SearchTool;

/// Name of the assembled pipeline.
pub const PIPELINE_NAME: &str = "career_builder";

/// Assembles the seven career steps.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn build_pipeline(
    config: &FlowConfig,
    search: Arc<dyn SearchTool>,
    event_sink: Arc<dyn EventSink>,
) -> Result<Orchestrator, CareerflowError> {
    config.validate()?;
    let toolkit = StepToolkit::new(search, RetryPolicy::new(config.retry.clone()))
        .with_event_sink(event_sink.clone());
    assemble(&config.profile, &toolkit, event_sink)
}

fn assemble(
    profile: &UserProfile,
    toolkit: &StepToolkit,
    event_sink: Arc<dyn EventSink>,
) -> Result<Orchestrator, CareerflowError> {
    Orchestrator::builder(PIPELINE_NAME)
        .step(InterestCapture::new(profile.clone()))
        .step(StreamResearch::new(toolkit.clone()))
        .step(LocationCapture::new(profile.clone()))
        .step(CollegeSearch::new(toolkit.clone()))
        .step(CriteriaSearch::new(toolkit.clone()))
        .step(Reviewer)
        .step(Summary)
        .with_event_sink(event_sink)
        .build()
}

fn item_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?:^|\s)\d+[.)]\s+").expect("item marker pattern is valid")
    })
}

/// Splits a numbered search result (`1. A, 2. B, 3. C.`) into its items.
///
/// Text without numbering is returned as a single item.
pub fn numbered_items(text: &str) -> Vec<String> {
    item_marker()
        .split(text)
        .map(|item| {
            item.trim()
                .trim_end_matches(|c: char| c == ',' || c == ';' || c == '.')
                .trim()
                .to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Reads a field as display text; non-string values render as JSON.
fn field_text(state: &SharedState, field: StateField) -> String {
    match state.get(field) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Reads one key of the `user_location` object.
fn location_part(state: &SharedState, key: &str) -> String {
    state
        .get(StateField::UserLocation)
        .and_then(|loc| loc.get(key))
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string()
}
