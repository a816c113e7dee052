//! Operation registration and typed call dispatch.
//!
//! This module implements the call path:
//!
//! 1. **Registry** (`registry`): operation name -> signature + handler, populated at startup
//! 2. **Dispatcher** (`dispatcher`): lookup, argument validation, invocation, return check
//! 3. **Middleware** (`middleware`): Tower layers around the dispatcher (metrics)
//! 4. **Domain operations** (`domain`): built-in handlers such as `hello`

pub mod dispatcher;
pub mod domain;
pub mod middleware;
pub mod registry;

// Re-export key types for convenient access.
pub use dispatcher::Dispatcher;
pub use domain::register_builtin_operations;
pub use middleware::{build_call_pipeline, CallPipeline};
pub use registry::{CallRegistry, OperationEntry, OperationHandler};
