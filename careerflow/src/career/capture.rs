//! Steps that record pre-resolved user inputs.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{field_text, numbered_items};
use crate::config::UserProfile;
use crate::errors::CareerflowError;
use crate::signal::ControlSignal;
use crate::state::{SharedState, StateField};
use crate::steps::PipelineStep;

/// `A1_InterestCapture`: records the user's area of interest.
#[derive(Debug, Clone)]
pub struct InterestCapture {
    profile: UserProfile,
}

impl InterestCapture {
    /// Creates the step.
    #[must_use]
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl PipelineStep for InterestCapture {
    fn name(&self) -> &str {
        "A1_InterestCapture"
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        let interest = self.profile.interest_area.trim();
        state.update([("interest_area", json!(interest))]);
        info!(step = self.name(), interest, "Captured user interest");
        Ok(ControlSignal::Continue)
    }
}

/// `A3_LocationCapture`: records where the user wants to study and which
/// suggested stream they pursue.
///
/// Without an explicit choice in the profile the first suggestion is taken.
#[derive(Debug, Clone)]
pub struct LocationCapture {
    profile: UserProfile,
}

impl LocationCapture {
    /// Creates the step.
    #[must_use]
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl PipelineStep for LocationCapture {
    fn name(&self) -> &str {
        "A3_LocationCapture"
    }

    fn requires(&self) -> &[StateField] {
        &[StateField::SuggestedStreams]
    }

    async fn run(&self, state: &mut SharedState) -> Result<ControlSignal, CareerflowError> {
        let suggestions = field_text(state, StateField::SuggestedStreams);
        info!(step = self.name(), suggestions = %suggestions, "Choosing a stream");

        let stream = match self.profile.target_stream.as_deref().map(str::trim) {
            Some(chosen) if !chosen.is_empty() => chosen.to_string(),
            _ => numbered_items(&suggestions).into_iter().next().ok_or_else(|| {
                CareerflowError::Validation("no suggested stream to choose from".to_string())
            })?,
        };

        let location = json!({
            "state": self.profile.state.trim(),
            "city": self.profile.city.trim(),
        });
        state.update([
            ("user_location", location),
            ("target_stream", json!(stream)),
        ]);
        info!(
            step = self.name(),
            stream = %stream,
            city = %self.profile.city,
            state = %self.profile.state,
            "User selection recorded"
        );
        Ok(ControlSignal::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interest_capture() {
        let mut state = SharedState::new();
        let step = InterestCapture::new(UserProfile::default());

        assert_eq!(step.execute(&mut state).await, ControlSignal::Continue);
        assert_eq!(
            state.get_str(StateField::InterestArea),
            Some("Biotechnology and sustainable energy")
        );
    }

    #[tokio::test]
    async fn test_location_capture_defaults_to_first_suggestion() {
        let mut state = SharedState::new();
        state.set(
            StateField::SuggestedStreams,
            json!("1. Marine Biology, 2. Oceanography, 3. Ecology."),
        );

        let step = LocationCapture::new(UserProfile::default());
        assert_eq!(step.execute(&mut state).await, ControlSignal::Continue);

        assert_eq!(state.get_str(StateField::TargetStream), Some("Marine Biology"));
        let location = state.get(StateField::UserLocation).unwrap();
        assert_eq!(location["city"], "Berkeley");
        assert_eq!(location["state"], "California");
    }

    #[tokio::test]
    async fn test_location_capture_needs_suggestions() {
        let mut state = SharedState::new();
        let step = LocationCapture::new(UserProfile::default());

        assert_eq!(step.execute(&mut state).await, ControlSignal::Error);
        assert!(state.populated_fields().is_empty());
    }

    #[tokio::test]
    async fn test_blank_suggestions_is_error() {
        let mut state = SharedState::new();
        state.set(StateField::SuggestedStreams, json!("   "));

        let step = LocationCapture::new(UserProfile::default());
        assert_eq!(step.execute(&mut state).await, ControlSignal::Error);
        assert!(!state.is_set(StateField::TargetStream));
    }
}
