//! Bounded exponential-backoff retries for external calls.
//!
//! Every external call a step makes goes through
//! [`RetryPolicy::execute_with_retry`]. Failures whose code is in the
//! configured retryable set are retried after
//! `initial_delay * exp_base^attempt_index`; anything else, or running out
//! of attempts, surfaces as a [`FatalExternalError`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::errors::{CareerflowError, FatalExternalError, ToolFailure};
use crate::events::{EventSink, NoOpEventSink};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay multiplier per attempt.
    #[serde(default = "default_exp_base")]
    pub exp_base: f64,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Failure codes that trigger a retry.
    #[serde(default = "default_retryable_codes")]
    pub retryable_codes: HashSet<u16>,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_exp_base() -> f64 {
    7.0
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_retryable_codes() -> HashSet<u16> {
    [429, 500, 503, 504].into_iter().collect()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            exp_base: default_exp_base(),
            initial_delay_ms: default_initial_delay_ms(),
            retryable_codes: default_retryable_codes(),
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the exponential base.
    #[must_use]
    pub fn with_exp_base(mut self, base: f64) -> Self {
        self.exp_base = base;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay_ms(mut self, delay: u64) -> Self {
        self.initial_delay_ms = delay;
        self
    }

    /// Replaces the retryable code set.
    #[must_use]
    pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    /// Returns true if a failure with this code should be retried.
    #[must_use]
    pub fn is_retryable(&self, code: u16) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Checks the configuration for values the policy cannot honor.
    pub fn validate(&self) -> Result<(), CareerflowError> {
        if self.max_attempts == 0 {
            return Err(CareerflowError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.exp_base.is_finite() || self.exp_base < 0.0 {
            return Err(CareerflowError::Config(format!(
                "retry.exp_base must be a non-negative number, got {}",
                self.exp_base
            )));
        }
        Ok(())
    }
}

/// Stateless retry wrapper around fallible external calls.
///
/// Each call to [`execute_with_retry`](Self::execute_with_retry) keeps its
/// own attempt counter, so one policy can be shared by every step.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    event_sink: Arc<dyn EventSink>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Creates a policy from a configuration.
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink that receives retry events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    // A zero budget would never call the operation at all.
    fn attempt_budget(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Returns the wait before the retry that follows attempt `attempt_index`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt_index: u32) -> Duration {
        let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
        let millis = self.config.initial_delay_ms as f64 * self.config.exp_base.powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }

    /// Returns the total time spent waiting when every attempt fails with
    /// a retryable code.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (0..self.attempt_budget() - 1)
            .map(|i| self.delay_for_attempt(i))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Runs `call` until it succeeds, fails with a non-retryable code, or
    /// the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`CareerflowError::FatalExternal`] tagged with the number of
    /// attempts made and the last failure.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: &str,
        mut call: F,
    ) -> Result<T, CareerflowError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ToolFailure>>,
    {
        let budget = self.attempt_budget();
        let mut attempt: u32 = 0;

        loop {
            let failure = match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(operation, attempts = attempt + 1, "External call recovered");
                    } else {
                        debug!(operation, "External call succeeded");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let attempts_made = attempt + 1;

            if !self.config.is_retryable(failure.code) {
                error!(
                    operation,
                    code = failure.code,
                    attempts = attempts_made,
                    error = %failure,
                    "External call failed with non-retryable code"
                );
                self.event_sink.emit(
                    "retry.not_retryable",
                    Some(serde_json::json!({
                        "operation": operation,
                        "code": failure.code,
                        "attempts": attempts_made,
                    })),
                );
                return Err(FatalExternalError::new(operation, failure, attempts_made, false).into());
            }

            if attempts_made >= budget {
                error!(
                    operation,
                    code = failure.code,
                    attempts = attempts_made,
                    error = %failure,
                    "External call retries exhausted"
                );
                self.event_sink.emit(
                    "retry.exhausted",
                    Some(serde_json::json!({
                        "operation": operation,
                        "code": failure.code,
                        "attempts": attempts_made,
                    })),
                );
                return Err(FatalExternalError::new(operation, failure, attempts_made, true).into());
            }

            let delay = self.delay_for_attempt(attempt);
            let transient = CareerflowError::TransientExternal(failure);
            warn!(
                operation,
                attempt = attempts_made,
                delay_ms = delay.as_millis() as u64,
                error = %transient,
                "Retrying after transient failure"
            );
            self.event_sink.emit(
                "retry.attempt",
                Some(serde_json::json!({
                    "operation": operation,
                    "attempt": attempts_made,
                    "delay_ms": delay.as_millis() as u64,
                })),
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fast_config() -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(4)
            .with_exp_base(2.0)
            .with_initial_delay_ms(10)
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.exp_base, 7.0);
        assert_eq!(config.initial_delay_ms, 1000);
        for code in [429, 500, 503, 504] {
            assert!(config.is_retryable(code));
        }
        assert!(!config.is_retryable(502));
        assert!(!config.is_retryable(404));
    }

    #[test]
    fn test_retry_config_validate() {
        assert!(RetryConfig::default().validate().is_ok());
        assert!(RetryConfig::new().with_max_attempts(0).validate().is_err());
        assert!(RetryConfig::new().with_exp_base(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_retry_config_deserialize_partial() {
        let config: RetryConfig = serde_json::from_str(r#"{"max_attempts": 2}"#).unwrap();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.exp_base, 7.0);
        assert_eq!(config.retryable_codes, default_retryable_codes());
    }

    #[test]
    fn test_delay_for_attempt_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(7000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(49_000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(343_000));
    }

    #[test]
    fn test_total_backoff_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_backoff(), Duration::from_millis(400_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try() {
        let policy = RetryPolicy::new(fast_config());
        let calls = AtomicU32::new(0);

        let result = policy
            .execute_with_retry("search", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ToolFailure>(42) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::new(fast_config());
        let calls = AtomicU32::new(0);

        let result = policy
            .execute_with_retry("search", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(ToolFailure::rate_limited(format!("attempt {n}")))
                    } else {
                        Ok("results".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "results");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_retryable_failure_uses_full_budget() {
        let sink = Arc::new(CollectingEventSink::new());
        let policy = RetryPolicy::new(fast_config()).with_event_sink(sink.clone());
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<String, _> = policy
            .execute_with_retry("search", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ToolFailure::unavailable("down")) }
            })
            .await;

        let elapsed = started.elapsed();
        let expected = Duration::from_millis(10 + 20 + 40);
        assert_eq!(policy.total_backoff(), expected);
        assert!(elapsed >= expected, "elapsed {elapsed:?} < {expected:?}");
        assert!(elapsed - expected < Duration::from_millis(5));

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(CareerflowError::FatalExternal(err)) => {
                assert_eq!(err.attempts, 4);
                assert_eq!(err.code, 503);
                assert!(err.exhausted);
            }
            other => panic!("expected FatalExternal, got {other:?}"),
        }

        assert_eq!(sink.events_of_type("retry.attempt").len(), 3);
        assert_eq!(sink.events_of_type("retry.exhausted").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_failure_short_circuits() {
        let policy = RetryPolicy::new(fast_config());
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<String, _> = policy
            .execute_with_retry("search", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ToolFailure::bad_request("bad query")) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        match result {
            Err(CareerflowError::FatalExternal(err)) => {
                assert_eq!(err.attempts, 1);
                assert_eq!(err.code, 400);
                assert!(!err.exhausted);
            }
            other => panic!("expected FatalExternal, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_call_starts_fresh() {
        let policy = RetryPolicy::new(fast_config().with_max_attempts(2));

        for _ in 0..2 {
            let calls = AtomicU32::new(0);
            let result: Result<(), _> = policy
                .execute_with_retry("search", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(ToolFailure::rate_limited("busy")) }
                })
                .await;
            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_budget_never_waits() {
        let policy = RetryPolicy::new(fast_config().with_max_attempts(1));
        let started = Instant::now();

        let result: Result<(), _> = policy
            .execute_with_retry("search", || async { Err(ToolFailure::unavailable("down")) })
            .await;

        assert!(matches!(result, Err(CareerflowError::FatalExternal(ref e)) if e.exhausted && e.attempts == 1));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(policy.total_backoff(), Duration::ZERO);
    }
}
