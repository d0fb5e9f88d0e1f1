//! HTTP-backed search tool.

use async_trait::async_trait;
use std::fmt;
use std::time::Instant;
use tracing::debug;

use super::SearchTool;
use crate::config::SearchConfig;
use crate::errors::{CareerflowError, ToolFailure};

/// A search tool that issues `GET {endpoint}?{query_param}={query}`.
///
/// Non-2xx responses become [`ToolFailure`]s carrying the HTTP status, so
/// the retry policy sees the same codes the service returned. Timeouts map
/// to 504 and connection failures to 503.
#[derive(Clone)]
pub struct HttpSearchTool {
    client: reqwest::Client,
    endpoint: String,
    config: SearchConfig,
}

impl fmt::Debug for HttpSearchTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSearchTool")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.config.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpSearchTool {
    /// Creates a tool for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns a config error if no endpoint is set or the client cannot
    /// be built.
    pub fn new(config: SearchConfig) -> Result<Self, CareerflowError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| CareerflowError::Config("search.endpoint is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CareerflowError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    fn classify(err: &reqwest::Error) -> ToolFailure {
        if err.is_timeout() {
            ToolFailure::new(504, format!("request timed out: {err}"))
        } else if err.is_connect() {
            ToolFailure::unavailable(format!("connection failed: {err}"))
        } else if let Some(status) = err.status() {
            ToolFailure::new(status.as_u16(), err.to_string())
        } else {
            ToolFailure::new(500, err.to_string())
        }
    }
}

#[async_trait]
impl SearchTool for HttpSearchTool {
    async fn search(&self, query: &str) -> Result<String, ToolFailure> {
        let start = Instant::now();
        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[(self.config.query_param.as_str(), query)]);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| Self::classify(&e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| Self::classify(&e))?;

        debug!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Search request finished"
        );

        if status.is_success() {
            Ok(body)
        } else {
            let snippet: String = body.chars().take(200).collect();
            Err(ToolFailure::new(status.as_u16(), snippet))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_endpoint() {
        let err = HttpSearchTool::new(SearchConfig::default()).unwrap_err();
        assert!(matches!(err, CareerflowError::Config(_)));
    }

    #[test]
    fn test_builds_with_endpoint() {
        let config = SearchConfig::default().with_endpoint("https://search.example.com/q");
        let tool = HttpSearchTool::new(config).unwrap();
        assert_eq!(tool.endpoint, "https://search.example.com/q");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let mut config = SearchConfig::default().with_endpoint("https://search.example.com/q");
        config.api_key = Some("sk-secret-token".to_string());
        let tool = HttpSearchTool::new(config).unwrap();

        let rendered = format!("{tool:?}");
        assert!(!rendered.contains("sk-secret-token"));
        assert!(rendered.contains("authenticated: true"));
    }
}
