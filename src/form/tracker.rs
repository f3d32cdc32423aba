use std::sync::Mutex;

use indexmap::IndexMap;

use crate::foundation::lock;
use crate::runtime::environment::Capability;

pub const VALIDATION_TRACKER: &str = "ValidationTracker";

#[derive(Debug, Default, Clone)]
struct TrackerState {
    field_errors: IndexMap<String, String>,
    form_errors: Vec<String>,
    inputs: IndexMap<String, String>,
}

/// Field and form errors of one submission plus the raw input of each field, so a failed
/// submission can be re-rendered with what the user typed.
#[derive(Debug, Default)]
pub struct ValidationTracker {
    state: Mutex<TrackerState>,
}

impl Capability for ValidationTracker {
    const NAME: &'static str = VALIDATION_TRACKER;
}

impl ValidationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for a field; the first error of a field is kept.
    pub fn record_error(&self, field: &str, message: impl Into<String>) {
        lock(&self.state)
            .field_errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn record_form_error(&self, message: impl Into<String>) {
        lock(&self.state).form_errors.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        let state = lock(&self.state);
        !state.field_errors.is_empty() || !state.form_errors.is_empty()
    }

    pub fn error_for(&self, field: &str) -> Option<String> {
        lock(&self.state).field_errors.get(field).cloned()
    }

    pub fn in_error(&self, field: &str) -> bool {
        lock(&self.state).field_errors.contains_key(field)
    }

    pub fn record_input(&self, field: &str, input: impl Into<String>) {
        lock(&self.state)
            .inputs
            .insert(field.to_string(), input.into());
    }

    pub fn input_for(&self, field: &str) -> Option<String> {
        lock(&self.state).inputs.get(field).cloned()
    }

    /// Form errors first, then field errors in recording order.
    pub fn errors(&self) -> Vec<String> {
        let state = lock(&self.state);
        state
            .form_errors
            .iter()
            .chain(state.field_errors.values())
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        *lock(&self.state) = TrackerState::default();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/form/tracker.rs"]
mod tests;
