//! HTTP handler definitions for the Buoy server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod call;
pub mod health;

pub use call::{call_handler, operations_handler};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::service::{CallPipeline, CallRegistry};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references and a cheaply clonable pipeline, so cloning per
/// request costs a few reference-count bumps.
#[derive(Clone)]
pub struct AppState {
    /// Dispatcher wrapped in the call middleware stack.
    pub pipeline: CallPipeline,
    /// Frozen operation registry, used for listing signatures.
    pub registry: Arc<CallRegistry>,
    /// Health state and in-flight call tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
