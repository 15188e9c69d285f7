//! Form state: raw field values, per-field errors and the submission-level error.

use std::collections::BTreeMap;

use shared::{domain::FormState, schema::FieldKey};

use crate::convert::parse_float;

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const NOT_A_NUMBER_MESSAGE: &str = "Must be a number";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Only presence is checked; bounds are presentation hints.
    #[default]
    Lenient,
    /// Presence, numeric parse and declared `[min, max]` are all checked.
    Strict,
}

/// Per-field validation messages. A field without an entry has no error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    errors: BTreeMap<FieldKey, String>,
}

impl ErrorState {
    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.errors.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.errors.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> + '_ {
        self.errors.iter().map(|(key, message)| (*key, message.as_str()))
    }

    fn insert(&mut self, key: FieldKey, message: impl Into<String>) {
        self.errors.insert(key, message.into());
    }

    fn clear(&mut self, key: FieldKey) {
        self.errors.remove(&key);
    }
}

/// Checks every field of `form` and returns the complete error set.
pub fn validate_form(form: &FormState, mode: ValidationMode) -> ErrorState {
    let mut errors = ErrorState::default();

    for (key, raw) in form.entries() {
        if raw.is_empty() {
            errors.insert(key, REQUIRED_MESSAGE);
            continue;
        }
        if mode == ValidationMode::Lenient {
            continue;
        }

        let value = parse_float(raw);
        let spec = key.spec();
        if value.is_nan() {
            errors.insert(key, NOT_A_NUMBER_MESSAGE);
        } else if !spec.contains(value) {
            errors.insert(key, format!("Must be between {} and {}", spec.min, spec.max));
        }
    }

    errors
}

#[derive(Debug, Clone, Default)]
pub struct FormStateManager {
    values: FormState,
    errors: ErrorState,
    submission_error: Option<String>,
    mode: ValidationMode,
}

impl FormStateManager {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Overwrites the raw value, clearing that field's error and any submission error.
    pub fn set_field(&mut self, key: FieldKey, value: impl Into<String>) {
        self.values.set(key, value);
        self.errors.clear(key);
        self.submission_error = None;
    }

    /// Replaces the error set with a fresh check. Returns whether the form is ready.
    pub fn validate(&mut self) -> bool {
        self.errors = validate_form(&self.values, self.mode);
        self.errors.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn value(&self, key: FieldKey) -> &str {
        self.values.get(key)
    }

    pub fn values(&self) -> &FormState {
        &self.values
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    pub fn error(&self, key: FieldKey) -> Option<&str> {
        self.errors.get(key)
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    pub fn set_submission_error(&mut self, message: impl Into<String>) {
        self.submission_error = Some(message.into());
    }

    pub fn dismiss_submission_error(&mut self) {
        self.submission_error = None;
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
