use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of an operation parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// UTF-8 text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// Boolean.
    Boolean,
    /// String-keyed record of nested values.
    Composite,
}

impl ValueType {
    /// Lowercase name used in error messages and on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Composite => "composite",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime value carried in call arguments and results.
///
/// Every variant maps to exactly one [`ValueType`], so type checks against a
/// declared signature are a plain comparison of [`Value::value_type`].
///
/// Serde uses the plain JSON mapping of [`Value::to_json`] and
/// [`Value::from_json`]: `"x"`, `3`, `true`, `{"k": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// UTF-8 text.
    Text(String),
    /// Signed 64-bit integer.
    Integer(i64),
    /// Boolean.
    Boolean(bool),
    /// Record of named fields.
    /// Uses `BTreeMap` for deterministic serialization order.
    Composite(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the runtime type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Text(_) => ValueType::Text,
            Self::Integer(_) => ValueType::Integer,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Composite(_) => ValueType::Composite,
        }
    }

    /// Borrows the inner string if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner integer if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the inner bool if this is a boolean value.
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrows the fields if this is a composite value.
    #[must_use]
    pub fn as_composite(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Composite(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self::Composite(fields)
    }
}
