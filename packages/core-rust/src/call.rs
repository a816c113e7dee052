use serde::{Deserialize, Serialize};

use crate::error::CallError;
use crate::types::Value;

/// Outcome of one dispatched call.
pub type CallResult = Result<Value, CallError>;

/// A single invocation of a named operation with positional arguments.
///
/// Fields are private so a request cannot be altered once built; the
/// dispatcher takes it by value and owns it for the duration of the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    operation: String,
    args: Vec<Value>,
}

impl CallRequest {
    /// Creates a request for `operation` with the given arguments.
    pub fn new(operation: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            operation: operation.into(),
            args,
        }
    }

    /// Name of the operation being invoked.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Positional arguments in parameter order.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Splits the request into its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.operation, self.args)
    }
}

/// Lifecycle of a call inside the dispatcher.
///
/// State machine:
/// `Received -> Validated -> Invoked -> Completed`, or
/// `Received -> Rejected` when lookup or argument validation fails, or
/// `Invoked -> Failed` when the handler fails or returns the wrong type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Received,
    Validated,
    Invoked,
    Completed,
    Rejected,
    Failed,
}

impl CallState {
    /// Whether no further transition is possible from this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Failed)
    }

    /// Terminal state reached by a call that produced `result`.
    #[must_use]
    pub fn of(result: &CallResult) -> Self {
        match result {
            Ok(_) => Self::Completed,
            Err(
                CallError::UnknownOperation { .. }
                | CallError::ArgumentTypeMismatch { .. }
                | CallError::DuplicateOperation { .. },
            ) => Self::Rejected,
            Err(CallError::ReturnTypeMismatch { .. } | CallError::HandlerFailure { .. }) => {
                Self::Failed
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Invoked => "invoked",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    #[test]
    fn request_exposes_parts() {
        let req = CallRequest::new("hello", vec![Value::from("World")]);
        assert_eq!(req.operation(), "hello");
        assert_eq!(req.args(), &[Value::from("World")]);

        let (op, args) = req.into_parts();
        assert_eq!(op, "hello");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn terminal_states() {
        assert!(CallState::Completed.is_terminal());
        assert!(CallState::Rejected.is_terminal());
        assert!(CallState::Failed.is_terminal());
        assert!(!CallState::Received.is_terminal());
        assert!(!CallState::Validated.is_terminal());
        assert!(!CallState::Invoked.is_terminal());
    }

    #[test]
    fn state_of_result() {
        assert_eq!(CallState::of(&Ok(Value::from(1))), CallState::Completed);

        let rejected = Err(CallError::ArgumentTypeMismatch {
            operation: "hello".to_string(),
            index: 0,
            expected: Some(ValueType::Text),
            actual: None,
        });
        assert_eq!(CallState::of(&rejected), CallState::Rejected);

        let failed = Err(CallError::HandlerFailure {
            operation: "hello".to_string(),
            message: "boom".to_string(),
        });
        assert_eq!(CallState::of(&failed), CallState::Failed);

        let bad_return = Err(CallError::ReturnTypeMismatch {
            operation: "hello".to_string(),
            expected: ValueType::Text,
            actual: ValueType::Integer,
        });
        assert_eq!(CallState::of(&bad_return), CallState::Failed);
    }
}
