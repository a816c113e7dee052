//! Buoy Core: value model, operation signatures, and call request/result types.

pub mod call;
pub mod error;
pub mod json;
pub mod schema;
pub mod types;

pub use call::{CallRequest, CallResult, CallState};
pub use error::{CallError, CallFailure, ErrorKind};
pub use json::{values_from_json, ConversionError};
pub use schema::{ParamDef, Signature};
pub use types::{Value, ValueType};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
