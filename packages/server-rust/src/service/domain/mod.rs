//! Built-in operations exposed by the server.
//!
//! Each submodule owns one group of operations and a `register` function that
//! adds them to a [`CallRegistry`]. [`register_builtin_operations`] is called
//! once at startup, before the registry is frozen behind an `Arc`.

pub mod greeting;
pub mod scraper;

use buoy_core::CallError;

use crate::service::registry::CallRegistry;

/// Registers every built-in operation.
///
/// # Errors
///
/// Returns `CallError::DuplicateOperation` if any built-in name is already
/// taken in `registry`.
pub fn register_builtin_operations(registry: &mut CallRegistry) -> Result<(), CallError> {
    greeting::register(registry)?;
    scraper::register(registry)?;
    Ok(())
}
