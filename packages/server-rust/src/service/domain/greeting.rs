//! The `hello` operation.

use anyhow::Context as _;
use buoy_core::{CallError, ParamDef, Value, ValueType};

use crate::service::registry::CallRegistry;

/// Name under which [`hello`] is registered.
pub const HELLO: &str = "hello";

/// Returns `"Hello, " + name + "!"` for a single text argument.
///
/// # Errors
///
/// Fails only if called without a leading text argument, which the
/// dispatcher's validation rules out.
pub fn hello(args: &[Value]) -> anyhow::Result<Value> {
    let name = args
        .first()
        .and_then(Value::as_text)
        .context("hello expects a text argument")?;
    Ok(Value::Text(format!("Hello, {name}!")))
}

/// Registers `hello(name: text) -> text`.
///
/// # Errors
///
/// Returns `CallError::DuplicateOperation` if `hello` is already registered.
pub fn register(registry: &mut CallRegistry) -> Result<(), CallError> {
    registry.register(
        HELLO,
        vec![ParamDef::new("name", ValueType::Text)],
        ValueType::Text,
        hello,
    )
}
