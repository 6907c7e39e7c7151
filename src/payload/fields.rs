//! Loosely typed form state.
//!
//! The HTTP API and the CLI both receive fields as `name -> value` pairs.
//! [`FieldMap`] holds them until [`PayloadRequest::from_fields`] turns them into
//! a typed request.
//!
//! [`PayloadRequest::from_fields`]: super::PayloadRequest::from_fields

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::QrDeckError;

/// A single form value: text inputs carry strings, checkboxes carry booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

/// Named form values for one payload scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, FieldValue>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), FieldValue::Text(value.into()));
        self
    }

    /// Set a checkbox field.
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) -> &mut Self {
        self.0.insert(name.into(), FieldValue::Flag(value));
        self
    }

    /// Builder-style variant of [`FieldMap::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style variant of [`FieldMap::set_flag`].
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.set_flag(name, value);
        self
    }

    /// Text value of a field, or `None` when it is absent.
    ///
    /// Flags read as `"true"` / `"false"`.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::Flag(true) => Some("true"),
            FieldValue::Flag(false) => Some("false"),
        }
    }

    /// Text value of a field; absent fields read as empty.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Checkbox value of a field.
    ///
    /// Text values `true`, `on`, `yes` and `1` also count as checked, so CLI
    /// `key=value` pairs work for boolean fields.
    pub fn flag(&self, name: &str) -> bool {
        match self.0.get(name) {
            Some(FieldValue::Flag(b)) => *b,
            Some(FieldValue::Text(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "on" | "yes" | "1"
            ),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `key=value` pairs (as given on the command line).
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, QrDeckError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = FieldMap::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                QrDeckError::InvalidInput(format!("expected key=value, got '{}'", pair))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(QrDeckError::InvalidInput(format!(
                    "missing field name in '{}'",
                    pair
                )));
            }
            map.set(key, value);
        }
        Ok(map)
    }
}
