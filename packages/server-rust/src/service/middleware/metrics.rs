//! Metrics middleware for calls.
//!
//! Records call duration and outcome both as `tracing` span fields and as
//! `metrics` counters/histograms. Without an installed recorder the `metrics`
//! macros are no-ops, so this layer is safe to use in tests.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use buoy_core::{CallError, CallRequest, CallState, Value};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

/// Counter of finished calls, labelled by `operation` and `outcome`.
pub const CALLS_TOTAL: &str = "buoy_calls_total";
/// Histogram of call latency in seconds, labelled by `operation`.
pub const CALL_DURATION_SECONDS: &str = "buoy_call_duration_seconds";
/// `operation` label for calls naming no registered operation. Caller-chosen
/// names never become label values, so the series count stays bounded by the
/// registry size.
pub const UNKNOWN_OPERATION_LABEL: &str = "unknown";

/// Label value for `operation`: the name itself only once lookup succeeded.
fn operation_label(operation: &str, result: &Result<Value, CallError>) -> String {
    match result {
        Err(CallError::UnknownOperation { .. }) => UNKNOWN_OPERATION_LABEL.to_string(),
        _ => operation.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments calls with timing and counting.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records call duration and terminal state.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<CallRequest> for MetricsService<S>
where
    S: Service<CallRequest, Response = Value, Error = CallError> + Send,
    S::Future: Send + 'static,
{
    type Response = Value;
    type Error = CallError;
    type Future = Pin<Box<dyn Future<Output = Result<Value, CallError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: CallRequest) -> Self::Future {
        let operation = request.operation().to_string();

        let span = info_span!(
            "call",
            operation = %operation,
            duration_us = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let start = Instant::now();
        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let result = fut.await;
                let elapsed = start.elapsed();
                let outcome = CallState::of(&result).as_str();

                #[allow(clippy::cast_possible_truncation)]
                let duration_us = elapsed.as_micros() as u64;
                tracing::Span::current().record("duration_us", duration_us);
                tracing::Span::current().record("outcome", outcome);

                let label = operation_label(&operation, &result);
                ::metrics::counter!(
                    CALLS_TOTAL,
                    "operation" => label.clone(),
                    "outcome" => outcome
                )
                .increment(1);
                ::metrics::histogram!(CALL_DURATION_SECONDS, "operation" => label)
                    .record(elapsed.as_secs_f64());

                match &result {
                    Ok(_) => tracing::info!(
                        operation = %operation,
                        duration_us,
                        outcome,
                        "call complete"
                    ),
                    Err(err) => tracing::info!(
                        operation = %operation,
                        duration_us,
                        outcome,
                        error_kind = err.kind().as_str(),
                        "call complete"
                    ),
                }

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::future::{ready, Ready};

    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    use super::*;

    /// Immediately-completing service that echoes its first argument.
    struct EchoService;

    impl Service<CallRequest> for EchoService {
        type Response = Value;
        type Error = CallError;
        type Future = Ready<Result<Value, CallError>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: CallRequest) -> Self::Future {
            let result = request.args().first().cloned().ok_or_else(|| {
                CallError::UnknownOperation {
                    name: request.operation().to_string(),
                }
            });
            ready(result)
        }
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_response() {
        let svc = MetricsLayer.layer(EchoService);
        let resp = svc
            .oneshot(CallRequest::new("echo", vec![Value::from("x")]))
            .await
            .unwrap();
        assert_eq!(resp, Value::from("x"));
    }

    /// Runs `calls` through a metrics-wrapped service with a local Prometheus
    /// recorder and returns the rendered exposition text.
    fn render_after(calls: Vec<CallRequest>) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                for request in calls {
                    let _ = MetricsLayer.layer(EchoService).oneshot(request).await;
                }
            });
        });
        handle.render()
    }

    fn calls_total_series(rendered: &str) -> Vec<&str> {
        rendered
            .lines()
            .filter(|line| line.starts_with(&format!("{CALLS_TOTAL}{{")))
            .collect()
    }

    #[test]
    fn unknown_names_share_one_series() {
        let calls = (0..200)
            .map(|i| CallRequest::new(format!("junk{i}"), vec![]))
            .collect();
        let rendered = render_after(calls);

        let series = calls_total_series(&rendered);
        assert_eq!(series.len(), 1, "{rendered}");
        assert!(series[0].contains(r#"operation="unknown""#));
        assert!(series[0].ends_with(" 200"));
        assert!(!rendered.contains("junk"));
    }

    #[test]
    fn known_operations_keep_their_name() {
        let rendered = render_after(vec![
            CallRequest::new("echo", vec![Value::from("a")]),
            CallRequest::new("echo", vec![Value::from("b")]),
        ]);

        let series = calls_total_series(&rendered);
        assert_eq!(series.len(), 1, "{rendered}");
        assert!(series[0].contains(r#"operation="echo""#));
        assert!(series[0].contains(r#"outcome="completed""#));
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_error() {
        let svc = MetricsLayer.layer(EchoService);
        let err = svc
            .oneshot(CallRequest::new("empty", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::UnknownOperation { name } if name == "empty"));
    }
}
