//! Typed call dispatch: lookup, argument validation, invocation, return check.

use std::any::Any;
use std::future::{ready, Ready};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll};

use buoy_core::{CallError, CallRequest, CallResult, CallState, ParamDef, Value};
use tower::Service;
use tracing::{debug, trace, warn};

use super::registry::{CallRegistry, OperationEntry};

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Validates calls against a [`CallRegistry`] and executes them.
///
/// The dispatcher holds no per-call state: each `dispatch` works only on its
/// own request and result, and the registry it reads is immutable. Cloning
/// is cheap (one `Arc`).
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CallRegistry>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<CallRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this dispatcher reads from.
    #[must_use]
    pub fn registry(&self) -> &Arc<CallRegistry> {
        &self.registry
    }

    /// Executes one call synchronously.
    ///
    /// Steps, in order: lookup, argument validation (first mismatch in
    /// parameter order wins), handler invocation, return-type check. A handler
    /// that returns `Err` or panics yields `CallError::HandlerFailure`; nothing
    /// escapes as a panic to the caller. Failed calls are not retried.
    ///
    /// # Errors
    ///
    /// - `UnknownOperation` if the operation is not registered
    /// - `ArgumentTypeMismatch` on a missing, surplus or mistyped argument
    /// - `HandlerFailure` if the handler fails
    /// - `ReturnTypeMismatch` if the handler returns a value of the wrong type
    pub fn dispatch(&self, request: CallRequest) -> CallResult {
        let (operation, args) = request.into_parts();
        trace!(%operation, state = CallState::Received.as_str(), "call received");

        let result = self.run(&operation, &args);

        let state = CallState::of(&result);
        match &result {
            Ok(_) => debug!(%operation, state = state.as_str(), "call completed"),
            Err(err) => debug!(%operation, state = state.as_str(), error = %err, "call not completed"),
        }
        result
    }

    fn run(&self, operation: &str, args: &[Value]) -> CallResult {
        let entry = self.registry.lookup(operation)?;
        validate_args(operation, entry.params(), args)?;
        trace!(%operation, state = CallState::Validated.as_str(), "arguments validated");

        let value = invoke(&entry, args)?;
        validate_return(&entry, &value)?;
        Ok(value)
    }
}

/// Checks arity and per-position types. Reports the first offending index.
fn validate_args(operation: &str, params: &[ParamDef], args: &[Value]) -> Result<(), CallError> {
    for (index, param) in params.iter().enumerate() {
        match args.get(index) {
            Some(arg) if arg.value_type() == param.ty => {}
            other => {
                return Err(CallError::ArgumentTypeMismatch {
                    operation: operation.to_string(),
                    index,
                    expected: Some(param.ty),
                    actual: other.map(Value::value_type),
                });
            }
        }
    }

    if let Some(surplus) = args.get(params.len()) {
        return Err(CallError::ArgumentTypeMismatch {
            operation: operation.to_string(),
            index: params.len(),
            expected: None,
            actual: Some(surplus.value_type()),
        });
    }
    Ok(())
}

/// Runs the handler, converting both `Err` returns and panics to
/// `HandlerFailure`.
fn invoke(entry: &OperationEntry, args: &[Value]) -> CallResult {
    trace!(operation = entry.name(), state = CallState::Invoked.as_str(), "invoking handler");

    let outcome = catch_unwind(AssertUnwindSafe(|| entry.handler().call(args)));
    let message = match outcome {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => format!("{err:#}"),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(operation = entry.name(), %message, "handler panicked");
            message
        }
    };

    Err(CallError::HandlerFailure {
        operation: entry.name().to_string(),
        message,
    })
}

fn validate_return(entry: &OperationEntry, value: &Value) -> Result<(), CallError> {
    let actual = value.value_type();
    if actual == entry.returns() {
        return Ok(());
    }
    warn!(
        operation = entry.name(),
        expected = %entry.returns(),
        actual = %actual,
        "handler returned a value of the wrong type"
    );
    Err(CallError::ReturnTypeMismatch {
        operation: entry.name().to_string(),
        expected: entry.returns(),
        actual,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

// ---------------------------------------------------------------------------
// tower::Service adapter
// ---------------------------------------------------------------------------

/// Exposes the dispatcher as a Tower service so middleware can wrap it.
///
/// Always ready; the returned future is already resolved because dispatch
/// has no suspension point.
impl Service<CallRequest> for Dispatcher {
    type Response = Value;
    type Error = CallError;
    type Future = Ready<CallResult>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: CallRequest) -> Self::Future {
        ready(self.dispatch(request))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
