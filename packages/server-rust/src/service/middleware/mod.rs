//! Tower middleware layers for the call pipeline.
//!
//! - [`metrics`]: Call timing, outcome counters and a tracing span per call
//! - [`pipeline`]: Composes all layers around the dispatcher

pub mod metrics;
pub mod pipeline;

pub use metrics::MetricsLayer;
pub use pipeline::{build_call_pipeline, CallPipeline};
