//! Configuration types for a careerflow run.
//!
//! Configuration is read from a JSON file (every section optional) and
//! then overridden by `CAREERFLOW_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::CareerflowError;
use crate::retry::RetryConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Retry policy for external calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Search tool setup.
    #[serde(default)]
    pub search: SearchConfig,
    /// Pre-resolved user inputs.
    #[serde(default)]
    pub profile: UserProfile,
}

impl FlowConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CareerflowError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CareerflowError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses configuration from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, CareerflowError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), CareerflowError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup.
    ///
    /// Recognized keys: `CAREERFLOW_LOG_LEVEL`, `CAREERFLOW_LOG_JSON`,
    /// `CAREERFLOW_SEARCH_ENDPOINT`, `CAREERFLOW_SEARCH_API_KEY`,
    /// `CAREERFLOW_MAX_ATTEMPTS`, `CAREERFLOW_INITIAL_DELAY_MS`,
    /// `CAREERFLOW_INTEREST`, `CAREERFLOW_STATE`, `CAREERFLOW_CITY`,
    /// `CAREERFLOW_TARGET_STREAM`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), CareerflowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("CAREERFLOW_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("CAREERFLOW_LOG_JSON") {
            self.logging.json = parse_bool("CAREERFLOW_LOG_JSON", &json)?;
        }
        if let Some(endpoint) = lookup("CAREERFLOW_SEARCH_ENDPOINT") {
            self.search.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("CAREERFLOW_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(attempts) = lookup("CAREERFLOW_MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_number("CAREERFLOW_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(delay) = lookup("CAREERFLOW_INITIAL_DELAY_MS") {
            self.retry.initial_delay_ms = parse_number("CAREERFLOW_INITIAL_DELAY_MS", &delay)?;
        }
        if let Some(interest) = lookup("CAREERFLOW_INTEREST") {
            self.profile.interest_area = interest;
        }
        if let Some(state) = lookup("CAREERFLOW_STATE") {
            self.profile.state = state;
        }
        if let Some(city) = lookup("CAREERFLOW_CITY") {
            self.profile.city = city;
        }
        if let Some(stream) = lookup("CAREERFLOW_TARGET_STREAM") {
            self.profile.target_stream = Some(stream);
        }
        self.validate()
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), CareerflowError> {
        self.retry.validate()?;
        if self.search.timeout_seconds <= 0.0 || !self.search.timeout_seconds.is_finite() {
            return Err(CareerflowError::Config(
                "search.timeout_seconds must be positive".to_string(),
            ));
        }
        self.profile.validate()
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, CareerflowError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CareerflowError::Config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CareerflowError> {
    raw.trim()
        .parse()
        .map_err(|_| CareerflowError::Config(format!("{key}: expected a number, got '{raw}'")))
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Configuration for the search tool.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTTP endpoint. When unset, canned offline results are used.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Query-string parameter carrying the query.
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Bearer token sent with each request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_timeout() -> f64 {
    30.0
}

fn default_user_agent() -> String {
    "careerflow/0.1".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            query_param: default_query_param(),
            api_key: None,
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("endpoint", &self.endpoint)
            .field("query_param", &self.query_param)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl SearchConfig {
    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }
}

/// User inputs resolved before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Area of interest.
    #[serde(default = "default_interest")]
    pub interest_area: String,
    /// State to study in.
    #[serde(default = "default_state")]
    pub state: String,
    /// City to study in.
    #[serde(default = "default_city")]
    pub city: String,
    /// Chosen stream; the first suggestion is used when unset.
    #[serde(default)]
    pub target_stream: Option<String>,
}

fn default_interest() -> String {
    "Biotechnology and sustainable energy".to_string()
}

fn default_state() -> String {
    "California".to_string()
}

fn default_city() -> String {
    "Berkeley".to_string()
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            interest_area: default_interest(),
            state: default_state(),
            city: default_city(),
            target_stream: None,
        }
    }
}

impl UserProfile {
    /// Rejects blank inputs.
    pub fn validate(&self) -> Result<(), CareerflowError> {
        for (name, value) in [
            ("profile.interest_area", &self.interest_area),
            ("profile.state", &self.state),
            ("profile.city", &self.city),
        ] {
            if value.trim().is_empty() {
                return Err(CareerflowError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = SearchConfig::default().with_endpoint("https://search.example.com");
        config.api_key = Some("sk-secret-token".to_string());

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret-token"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("search.example.com"));
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = FlowConfig::from_json_str("{}").unwrap();
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.search.endpoint.is_none());
        assert_eq!(config.profile, UserProfile::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = FlowConfig::from_json_str(
            r#"{"retry": {"max_attempts": 2, "initial_delay_ms": 5}, "profile": {"city": "Davis"}}"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_delay_ms, 5);
        assert_eq!(config.profile.city, "Davis");
        assert_eq!(config.profile.state, "California");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(FlowConfig::from_json_str(r#"{"retry": {"max_attempts": 0}}"#).is_err());
        assert!(FlowConfig::from_json_str(r#"{"profile": {"city": "  "}}"#).is_err());
        assert!(FlowConfig::from_json_str(r#"{"search": {"timeout_seconds": 0}}"#).is_err());
        assert!(matches!(
            FlowConfig::from_json_str("not json"),
            Err(CareerflowError::Serialization(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"logging": {{"level": "debug", "json": true}}}}"#).unwrap();

        let config = FlowConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = FlowConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CareerflowError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("CAREERFLOW_LOG_JSON", "yes"),
            ("CAREERFLOW_MAX_ATTEMPTS", "3"),
            ("CAREERFLOW_SEARCH_ENDPOINT", "https://search.example.com"),
            ("CAREERFLOW_TARGET_STREAM", "Environmental Science and Policy"),
        ]
        .into_iter()
        .collect();

        let mut config = FlowConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert!(config.logging.json);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.search.endpoint.as_deref(), Some("https://search.example.com"));
        assert_eq!(
            config.profile.target_stream.as_deref(),
            Some("Environmental Science and Policy")
        );
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = FlowConfig::default();
        let err = config
            .apply_overrides(|key| (key == "CAREERFLOW_MAX_ATTEMPTS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("CAREERFLOW_MAX_ATTEMPTS"));
    }
}
