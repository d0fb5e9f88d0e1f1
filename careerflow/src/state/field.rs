//! The closed set of state field names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::UnknownStateKeyError;

/// A field of [`SharedState`](super::SharedState).
///
/// The set is fixed at compile time; names outside it cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    /// The user's area of interest.
    InterestArea,
    /// Educational streams suggested for the interest.
    SuggestedStreams,
    /// Where the user wants to study (`{state, city}`).
    UserLocation,
    /// The stream the user settled on.
    TargetStream,
    /// Colleges found for the stream and location.
    CollegeResults,
    /// Admission criteria per college.
    CriteriaDetails,
    /// Findings from the review pass.
    ReviewerNotes,
    /// The final report.
    FinalSummary,
}

impl StateField {
    /// Every field, in pipeline order.
    pub const ALL: [Self; 8] = [
        Self::InterestArea,
        Self::SuggestedStreams,
        Self::UserLocation,
        Self::TargetStream,
        Self::CollegeResults,
        Self::CriteriaDetails,
        Self::ReviewerNotes,
        Self::FinalSummary,
    ];

    /// Returns the field's name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InterestArea => "interest_area",
            Self::SuggestedStreams => "suggested_streams",
            Self::UserLocation => "user_location",
            Self::TargetStream => "target_stream",
            Self::CollegeResults => "college_results",
            Self::CriteriaDetails => "criteria_details",
            Self::ReviewerNotes => "reviewer_notes",
            Self::FinalSummary => "final_summary",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateField {
    type Err = UnknownStateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownStateKeyError::new(s))
    }
}
