//! Network module with deferred startup lifecycle.
//!
//! `new()` wires shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown future resolves. Binding
//! separately from serving lets callers learn the OS-assigned port first.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    call_handler, health_handler, liveness_handler, operations_handler, readiness_handler,
    AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::service::{build_call_pipeline, CallRegistry, Dispatcher};

/// Owns the HTTP server lifecycle around a frozen [`CallRegistry`].
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    registry: Arc<CallRegistry>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, registry: Arc<CallRegistry>) -> Self {
        Self {
            config,
            listener: None,
            registry,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `POST /call/{operation}` -- dispatch one call
    /// - `GET /operations` -- registered signatures
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    pub fn build_router(&self) -> Router {
        let state = AppState {
            pipeline: build_call_pipeline(Dispatcher::new(Arc::clone(&self.registry))),
            registry: Arc::clone(&self.registry),
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
        };

        Router::new()
            .route("/call/{operation}", post(call_handler))
            .route("/operations", get(operations_handler))
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the TCP listener and returns the actual bound port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves calls until `shutdown` resolves, then drains in-flight calls.
    ///
    /// On the shutdown signal the health state moves to Draining (new calls
    /// get 503), the server stops accepting connections, and in-flight calls
    /// get up to `drain_timeout` to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, or if the server
    /// hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let Self {
            config,
            listener,
            shutdown: controller,
            ..
        } = self;
        let listener = listener.context("start() must be called before serve()")?;

        let signal_controller = Arc::clone(&controller);
        let signal = async move {
            shutdown.await;
            info!("shutdown signal received");
            signal_controller.trigger_shutdown();
        };

        controller.set_ready();

        if let Some(tls) = &config.tls {
            serve_tls(listener, router, tls, signal).await?;
        } else {
            info!("serving plain HTTP");
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await?;
        }

        drain(&controller, &config).await;
        Ok(())
    }
}

/// Serves TLS connections using `axum-server` with rustls.
///
/// Reuses the pre-bound listener by converting it to a `std::net::TcpListener`.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .context("failed to load TLS certificates")?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        signal.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving HTTPS");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn drain(controller: &ShutdownController, config: &NetworkConfig) {
    // The signal future normally did this already; a server that stopped on
    // its own still has to leave the Ready state.
    controller.trigger_shutdown();

    let in_flight = controller.in_flight_count();
    if in_flight > 0 {
        info!(in_flight, "waiting for in-flight calls");
    }

    if controller.wait_for_drain(config.drain_timeout).await {
        info!("all calls drained");
    } else {
        warn!(
            in_flight = controller.in_flight_count(),
            "drain timeout expired with calls still running"
        );
    }
}
