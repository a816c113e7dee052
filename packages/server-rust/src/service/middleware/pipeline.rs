//! Pipeline composition: wraps the dispatcher in the call middleware stack.

use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, MetricsService};
use crate::service::dispatcher::Dispatcher;

/// The composed call service: dispatcher wrapped in every call-level layer.
pub type CallPipeline = MetricsService<Dispatcher>;

/// Build the call pipeline by wrapping the `Dispatcher` with middleware layers.
///
/// The only layer is `MetricsLayer`. Deadlines are applied by the HTTP stack
/// around the whole request, not per call.
///
/// The returned service implements `tower::Service<CallRequest>` and is
/// `Clone`, so each HTTP request can take its own copy.
#[must_use]
pub fn build_call_pipeline(dispatcher: Dispatcher) -> CallPipeline {
    ServiceBuilder::new().layer(MetricsLayer).service(dispatcher)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
