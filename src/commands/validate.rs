//! Request field maps and required-field checks.
//!
//! Handlers build a [`WebRequest`] from the invocation's tokens, then check
//! it against a static list of [`RequiredField`]s before any network call.
//! Every required field is checked; one [`MissingArgument`] is reported per
//! field that has no value.

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{CommandError, MissingArgument};

/// A field that must carry a value, with the name users know it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredField {
    pub key: &'static str,
    pub label: Option<&'static str>,
}

impl RequiredField {
    pub const fn labeled(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label: Some(label),
        }
    }

    /// A field filled in by the bot itself; users get the generic message.
    pub const fn unlabeled(key: &'static str) -> Self {
        Self { key, label: None }
    }
}

/// JSON request body under construction. Absent optional values are simply
/// not inserted, so they never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WebRequest(Map<String, Value>);

impl WebRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Insert `value` only when present.
    pub fn optional(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String form of a field, for echoing back to the user.
    pub fn text(&self, key: &str) -> String {
        crate::messages::display_value(self.get(key))
    }

    /// A field is defined when present, not null, and not a blank string.
    pub fn is_defined(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }
}

/// Every required field without a value, in descriptor order.
pub fn validate(request: &WebRequest, required: &[RequiredField]) -> Vec<MissingArgument> {
    required
        .iter()
        .filter(|field| !request.is_defined(field.key))
        .map(|field| MissingArgument {
            field: field.key.to_string(),
            label: field.label.map(str::to_string),
        })
        .collect()
}

/// [`validate`] as a `Result`, for `?` in handlers.
pub fn require(request: &WebRequest, required: &[RequiredField]) -> Result<(), CommandError> {
    let missing = validate(request, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CommandError::MissingArguments(missing))
    }
}
