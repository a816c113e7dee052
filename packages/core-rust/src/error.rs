//! Error taxonomy for registration and dispatch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// Classification of call errors, as reported to remote callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An operation with the same name is already registered.
    DuplicateOperation,
    /// No operation with the requested name is registered.
    UnknownOperation,
    /// An argument is missing, surplus, or of the wrong type.
    ArgumentTypeMismatch,
    /// The handler produced a value of the wrong type.
    ReturnTypeMismatch,
    /// The handler itself failed.
    HandlerFailure,
}

impl ErrorKind {
    /// Snake-case name, identical to the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateOperation => "duplicate_operation",
            Self::UnknownOperation => "unknown_operation",
            Self::ArgumentTypeMismatch => "argument_type_mismatch",
            Self::ReturnTypeMismatch => "return_type_mismatch",
            Self::HandlerFailure => "handler_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders an optional type, where `None` means "no argument in this position".
struct TypeSlot<'a>(&'a Option<ValueType>);

impl fmt::Display for TypeSlot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ty) => fmt::Display::fmt(ty, f),
            None => f.write_str("nothing"),
        }
    }
}

/// Errors returned by the registry and the dispatcher.
///
/// None of these are fatal: a failed call leaves the registry and subsequent
/// calls unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("operation already registered: {name}")]
    DuplicateOperation { name: String },

    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },

    /// `expected` is `None` for a surplus argument; `actual` is `None` for a
    /// missing one.
    #[error(
        "argument {index} of {operation}: expected {}, got {}",
        TypeSlot(.expected),
        TypeSlot(.actual)
    )]
    ArgumentTypeMismatch {
        operation: String,
        index: usize,
        expected: Option<ValueType>,
        actual: Option<ValueType>,
    },

    #[error("{operation} returned {actual}, declared {expected}")]
    ReturnTypeMismatch {
        operation: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("{operation} failed: {message}")]
    HandlerFailure { operation: String, message: String },
}

impl CallError {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateOperation { .. } => ErrorKind::DuplicateOperation,
            Self::UnknownOperation { .. } => ErrorKind::UnknownOperation,
            Self::ArgumentTypeMismatch { .. } => ErrorKind::ArgumentTypeMismatch,
            Self::ReturnTypeMismatch { .. } => ErrorKind::ReturnTypeMismatch,
            Self::HandlerFailure { .. } => ErrorKind::HandlerFailure,
        }
    }

    /// Converts into the structured form sent to remote callers.
    #[must_use]
    pub fn to_failure(&self) -> CallFailure {
        CallFailure {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Wire form of a failed call: kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CallError> for CallFailure {
    fn from(err: &CallError) -> Self {
        err.to_failure()
    }
}
