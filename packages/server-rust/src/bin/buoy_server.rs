//! Buoy server binary: registers the built-in operations and serves them.

use std::sync::Arc;

use buoy_server::{register_builtin_operations, telemetry, CallRegistry, NetworkModule, ServerArgs};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    telemetry::init_tracing(args.log_format)?;

    if let Some(addr) = args.metrics_addr {
        telemetry::init_metrics(addr)?;
    }

    let mut registry = CallRegistry::new();
    register_builtin_operations(&mut registry)?;
    let registry = Arc::new(registry);
    info!(
        operations = ?registry.operations().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "registry populated"
    );

    let mut module = NetworkModule::new(args.network_config(), registry);
    let port = module.start().await?;
    info!(port, "buoy-server ready");

    module.serve(shutdown_signal()).await?;
    info!("buoy-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
        // Without a signal handler there is no way to stop gracefully; keep serving.
        std::future::pending::<()>().await;
    }
}
