//! Error types for the careerflow orchestrator.
//!
//! The taxonomy separates expected failure paths (unknown state keys,
//! missing step inputs, external call failures) from defects caught at
//! the orchestrator's fault boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for careerflow operations.
#[derive(Debug, Clone, Error)]
pub enum CareerflowError {
    /// A state write targeted a field that does not exist.
    #[error("{0}")]
    UnknownStateKey(#[from] UnknownStateKeyError),

    /// A step's required input field was absent.
    #[error("{0}")]
    MissingPrecondition(#[from] MissingPreconditionError),

    /// A retryable external failure. Absorbed by the retry policy while
    /// attempts remain.
    #[error("Transient external error: {0}")]
    TransientExternal(ToolFailure),

    /// Retries exhausted or a non-retryable failure was encountered.
    #[error("{0}")]
    FatalExternal(#[from] FatalExternalError),

    /// A fault not anticipated by a step's own logic.
    #[error("Unexpected fault in step '{step}': {message}")]
    UnexpectedFault {
        /// The step that faulted.
        step: String,
        /// The fault description.
        message: String,
    },

    /// The pipeline halted without producing a summary.
    #[error("Pipeline aborted: {0}")]
    Aborted(String),

    /// The pipeline definition is invalid.
    #[error("Pipeline validation error: {0}")]
    Validation(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl CareerflowError {
    /// Creates an unexpected fault error.
    #[must_use]
    pub fn unexpected_fault(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedFault {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Returns a stable kind label used in events and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownStateKey(_) => "unknown_state_key",
            Self::MissingPrecondition(_) => "missing_precondition",
            Self::TransientExternal(_) => "transient_external",
            Self::FatalExternal(_) => "fatal_external",
            Self::UnexpectedFault { .. } => "unexpected_fault",
            Self::Aborted(_) => "aborted",
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }

    /// Returns true if the error is absorbed by retries rather than halting.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientExternal(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::UnknownStateKey(e) => {
                map.insert("key".to_string(), serde_json::json!(e.key));
            }
            Self::MissingPrecondition(e) => {
                map.insert("step".to_string(), serde_json::json!(e.step));
                map.insert("fields".to_string(), serde_json::json!(e.fields));
            }
            Self::TransientExternal(failure) => {
                map.insert("code".to_string(), serde_json::json!(failure.code));
            }
            Self::FatalExternal(e) => {
                map.insert("operation".to_string(), serde_json::json!(e.operation));
                map.insert("code".to_string(), serde_json::json!(e.code));
                map.insert("attempts".to_string(), serde_json::json!(e.attempts));
                map.insert("exhausted".to_string(), serde_json::json!(e.exhausted));
            }
            Self::UnexpectedFault { step, .. } => {
                map.insert("step".to_string(), serde_json::json!(step));
            }
            Self::Aborted(_)
            | Self::Validation(_)
            | Self::Config(_)
            | Self::Serialization(_)
            | Self::Io(_) => {}
        }

        map
    }
}

impl From<serde_json::Error> for CareerflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for CareerflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A failure reported by an external tool, classified by code.
///
/// Codes follow HTTP status semantics so that transient service
/// conditions (429, 5xx) can be told apart from permanent ones.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct ToolFailure {
    /// Classification code.
    pub code: u16,
    /// Human-readable description.
    pub message: String,
}

impl ToolFailure {
    /// Creates a new tool failure.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Rate limited (429).
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(429, message)
    }

    /// Service unavailable (503).
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(503, message)
    }

    /// Bad request (400).
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

/// Error raised when writing to a field that is not declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown state key: '{key}'")]
pub struct UnknownStateKeyError {
    /// The rejected key.
    pub key: String,
}

impl UnknownStateKeyError {
    /// Creates a new unknown state key error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Error raised when a step runs without its required inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Step '{step}' is missing required state: {}", .fields.join(", "))]
pub struct MissingPreconditionError {
    /// The step that could not run.
    pub step: String,
    /// The absent field names.
    pub fields: Vec<String>,
}

impl MissingPreconditionError {
    /// Creates a new missing precondition error.
    #[must_use]
    pub fn new(step: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            step: step.into(),
            fields,
        }
    }
}

/// Error returned when an external call gives up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("External call '{operation}' failed after {attempts} attempt(s): {failure}")]
pub struct FatalExternalError {
    /// The operation that was attempted.
    pub operation: String,
    /// Code of the last failure.
    pub code: u16,
    /// Number of attempts made.
    pub attempts: u32,
    /// True if the code was retryable but the attempt budget ran out.
    pub exhausted: bool,
    /// The last failure observed.
    pub failure: ToolFailure,
}

impl FatalExternalError {
    /// Creates a new fatal external error from the last failure.
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        failure: ToolFailure,
        attempts: u32,
        exhausted: bool,
    ) -> Self {
        Self {
            operation: operation.into(),
            code: failure.code,
            attempts,
            exhausted,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_state_key_display() {
        let err = CareerflowError::from(UnknownStateKeyError::new("favourite_colour"));
        assert!(err.to_string().contains("favourite_colour"));
        assert_eq!(err.kind(), "unknown_state_key");
    }

    #[test]
    fn test_missing_precondition_lists_fields() {
        let err = MissingPreconditionError::new(
            "A4_CollegeSearch",
            vec!["target_stream".to_string(), "user_location".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("A4_CollegeSearch"));
        assert!(msg.contains("target_stream, user_location"));
    }

    #[test]
    fn test_fatal_external_to_dict() {
        let err = CareerflowError::from(FatalExternalError::new(
            "search",
            ToolFailure::unavailable("down"),
            5,
            true,
        ));
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "fatal_external");
        assert_eq!(dict.get("code").unwrap(), 503);
        assert_eq!(dict.get("attempts").unwrap(), 5);
        assert_eq!(dict.get("exhausted").unwrap(), true);
    }

    #[test]
    fn test_transient_is_transient() {
        let err = CareerflowError::TransientExternal(ToolFailure::rate_limited("slow down"));
        assert!(err.is_transient());
        assert!(!CareerflowError::Validation("x".into()).is_transient());
    }

    #[test]
    fn test_tool_failure_display() {
        let failure = ToolFailure::bad_request("malformed query");
        assert_eq!(failure.to_string(), "[400] malformed query");
    }
}
