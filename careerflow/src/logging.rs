//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over [`LoggingConfig::level`]. Output goes
//! to stderr so that stdout carries only the final report.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::errors::CareerflowError;

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns a config error if the level directive is invalid or a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), CareerflowError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            CareerflowError::Config(format!("invalid log level '{}': {e}", config.level))
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init()
    };

    result.map_err(|e| CareerflowError::Config(format!("failed to install subscriber: {e}")))
}
