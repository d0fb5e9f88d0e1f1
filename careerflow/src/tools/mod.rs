//! External tool capabilities consumed by pipeline steps.
//!
//! Steps never talk to the network directly; they call a [`SearchTool`]
//! through the retry policy. Implementations:
//! - [`CannedSearchTool`] for offline, deterministic results
//! - [`HttpSearchTool`] for a real HTTP endpoint (`websearch` feature)

mod canned;
#[cfg(feature = "websearch")]
mod http;

pub use canned::{CannedRule, CannedSearchTool};
#[cfg(feature = "websearch")]
pub use http::HttpSearchTool;

use async_trait::async_trait;

use crate::errors::ToolFailure;

/// A query tool that returns a textual result for a query string.
///
/// Failures carry a classification code; the retry policy decides from
/// that code whether another attempt is worthwhile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Runs a query.
    async fn search(&self, query: &str) -> Result<String, ToolFailure>;
}
