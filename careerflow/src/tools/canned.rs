//! Deterministic offline search results.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use super::SearchTool;
use crate::errors::ToolFailure;

/// A canned response returned when every keyword appears in the query.
#[derive(Debug, Clone)]
pub struct CannedRule {
    keywords: Vec<String>,
    response: String,
}

impl CannedRule {
    /// Creates a rule. Keywords match case-insensitively.
    #[must_use]
    pub fn new<I, S>(keywords: I, response: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
            response: response.into(),
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.keywords.iter().all(|k| query.contains(k.as_str()))
    }
}

/// A search tool answering from a fixed rule table.
///
/// Rules are checked in insertion order; the first match wins. Queries
/// matching no rule fail with code 404.
#[derive(Debug, Default)]
pub struct CannedSearchTool {
    rules: Vec<CannedRule>,
    calls: AtomicUsize,
}

impl CannedSearchTool {
    /// Creates an empty tool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: CannedRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns a tool preloaded with sample education search results.
    #[must_use]
    pub fn education_samples() -> Self {
        Self::new()
            .with_rule(CannedRule::new(
                ["admission criteria", "berkeley"],
                "UC Berkeley: GPA 4.0+, SAT/ACT Optional, essays focused on innovation.",
            ))
            .with_rule(CannedRule::new(
                ["admission criteria", "stanford"],
                "Stanford: Extremely selective, requires two recommendation letters, unique project portfolio.",
            ))
            .with_rule(CannedRule::new(
                ["admission criteria", "davis"],
                "UC Davis: Minimum GPA 3.5, emphasis on high school science courses.",
            ))
            .with_rule(CannedRule::new(
                ["streams"],
                "1. Applied Biological Sciences (Focus on Bio-engineering), \
                 2. Environmental Science and Policy, \
                 3. Chemical Engineering with a focus on Renewable Fuels.",
            ))
            .with_rule(CannedRule::new(
                ["colleges"],
                "1. University of California, Berkeley (Bioengineering), \
                 2. Stanford University (Sustainable Science and Tech), \
                 3. UC Davis (Applied Biology).",
            ))
    }

    /// Returns the number of queries answered or rejected so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchTool for CannedSearchTool {
    async fn search(&self, query: &str) -> Result<String, ToolFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let normalized = query.to_lowercase();

        match self.rules.iter().find(|rule| rule.matches(&normalized)) {
            Some(rule) => {
                debug!(query, "Canned search hit");
                Ok(rule.response.clone())
            }
            None => Err(ToolFailure::new(404, format!("no results for '{query}'"))),
        }
    }
}
