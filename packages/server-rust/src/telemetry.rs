//! Logging and metrics bootstrap.
//!
//! Library code only emits `tracing` events and `metrics` samples; this module
//! is where the binary decides where they go. Call each function once at
//! startup.

use std::io::IsTerminal as _;
use std::net::SocketAddr;

use anyhow::Context as _;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Builds the env filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Builds the `fmt` subscriber for `format`, writing to `writer`.
///
/// `Pretty` uses the multi-line human-readable formatter; `Json` emits one
/// object per event with the current span attached.
pub fn build_subscriber<W>(
    format: LogFormat,
    filter: EnvFilter,
    writer: W,
    ansi: bool,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    match format {
        LogFormat::Pretty => Box::new(builder.pretty().with_ansi(ansi).finish()),
        LogFormat::Json => Box::new(
            builder
                .json()
                .with_current_span(true)
                .with_ansi(false)
                .finish(),
        ),
    }
}

/// Installs the global `tracing` subscriber, logging to stdout.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let ansi = std::io::stdout().is_terminal();
    build_subscriber(format, env_filter(), std::io::stdout, ansi)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Installs the Prometheus recorder and its scrape listener on `addr`.
///
/// Must run inside a Tokio runtime.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot be bound.
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to install Prometheus exporter on {addr}"))?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
