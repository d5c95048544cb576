//! Raw Listing Records
//!
//! A raw record is one apartment listing as received over the wire: an
//! ordered map from field name to a scalar JSON value. Field order follows
//! the request body.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

/// Presence-checked view of a single record field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    /// Key not present in the record
    Absent,
    /// Key present with an explicit null
    Null,
    /// Key present with a value
    Value(&'a Value),
}

impl Field<'_> {
    /// Whether the key exists in the record at all
    pub fn is_present(&self) -> bool {
        !matches!(self, Field::Absent)
    }
}

/// One apartment listing as received from the HTTP layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a parsed JSON body, which must be an object
    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ValidationError::InvalidFormat(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Insert or replace a field, keeping the position of an existing key
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Look up a field, distinguishing absent keys from explicit nulls
    pub fn field(&self, name: &str) -> Field<'_> {
        match self.fields.get(name) {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(value) => Field::Value(value),
        }
    }

    /// Names from `required` that are not present in the record, in the given order
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.field(name).is_present())
            .collect()
    }

    /// Remove every listed field that is present. Absent fields are skipped.
    ///
    /// Returns the number of fields actually removed.
    pub fn drop_fields(&mut self, names: &[&str]) -> usize {
        let mut removed = 0;
        for name in names {
            // shift_remove keeps the order of the remaining fields
            if self.fields.shift_remove(*name).is_some() {
                trace!("Dropped field {}", name);
                removed += 1;
            }
        }
        removed
    }

    /// Iterate fields in record order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
