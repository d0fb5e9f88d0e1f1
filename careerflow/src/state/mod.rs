//! Shared pipeline state.
//!
//! [`SharedState`] is the single mutable record a pipeline run accumulates.
//! Writes by name go through [`SharedState::update`], which only accepts the
//! predeclared [`StateField`] names and drops anything else with a warning.

mod field;

pub use field::StateField;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::UnknownStateKeyError;
use crate::events::{EventSink, NoOpEventSink};

/// The result of a [`SharedState::update`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    /// Fields that were written, in call order.
    pub applied: Vec<StateField>,
    /// Rejected writes.
    pub rejected: Vec<UnknownStateKeyError>,
}

impl StateUpdate {
    /// Returns true if every entry was applied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Typed key/value store shared by every step of a run.
#[derive(Clone)]
pub struct SharedState {
    values: BTreeMap<StateField, serde_json::Value>,
    event_sink: Arc<dyn EventSink>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl SharedState {
    /// Creates an empty state with no event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink that receives mutation diagnostics.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Applies a batch of named writes.
    ///
    /// Entries whose name is not a [`StateField`] are skipped and reported
    /// as `state.unknown_key`; all valid entries are applied regardless.
    /// Writing `null` clears the field.
    pub fn update<I, K>(&mut self, fields: I) -> StateUpdate
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: AsRef<str>,
    {
        let mut result = StateUpdate::default();

        for (name, value) in fields {
            let name = name.as_ref();
            match name.parse::<StateField>() {
                Ok(field) => {
                    if value.is_null() {
                        self.values.remove(&field);
                    } else {
                        self.values.insert(field, value);
                    }
                    result.applied.push(field);
                }
                Err(err) => {
                    warn!(key = %name, "Attempted to set unknown state key");
                    self.event_sink.emit(
                        "state.unknown_key",
                        Some(serde_json::json!({ "key": name })),
                    );
                    result.rejected.push(err);
                }
            }
        }

        if !result.applied.is_empty() {
            let changed: Vec<&str> = result.applied.iter().map(StateField::as_str).collect();
            info!(fields = ?changed, "State updated");
            self.event_sink.emit(
                "state.updated",
                Some(serde_json::json!({ "fields": changed })),
            );
        }

        result
    }

    /// Writes a single typed field.
    pub fn set(&mut self, field: StateField, value: serde_json::Value) {
        self.update([(field.as_str(), value)]);
    }

    /// Returns a field's value, or `None` while it is unset.
    #[must_use]
    pub fn get(&self, field: StateField) -> Option<&serde_json::Value> {
        self.values.get(&field)
    }

    /// Returns a field's value if it is a string.
    #[must_use]
    pub fn get_str(&self, field: StateField) -> Option<&str> {
        self.get(field).and_then(serde_json::Value::as_str)
    }

    /// Looks a field up by name. Unknown names read as absent.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&serde_json::Value> {
        name.parse::<StateField>().ok().and_then(|field| self.get(field))
    }

    /// Returns true if the field has been written.
    #[must_use]
    pub fn is_set(&self, field: StateField) -> bool {
        self.values.contains_key(&field)
    }

    /// Returns the populated fields in declaration order.
    #[must_use]
    pub fn populated_fields(&self) -> Vec<StateField> {
        self.values.keys().copied().collect()
    }

    /// Returns the subset of `required` that is not yet set.
    #[must_use]
    pub fn missing(&self, required: &[StateField]) -> Vec<StateField> {
        required.iter().copied().filter(|f| !self.is_set(*f)).collect()
    }

    /// Returns a JSON object of the populated fields.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(field, value)| (field.as_str().to_string(), value.clone()))
            .collect();
        serde_json::Value::Object(map)
    }
}
