//! Command-line and environment configuration for the server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::network::{NetworkConfig, TlsConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Buoy server - typed remote calls over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(name = "buoy-server", version, about)]
pub struct ServerArgs {
    /// Bind address.
    #[arg(long, env = "BUOY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. 0 picks a free port.
    #[arg(long, env = "BUOY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Deadline for a single HTTP request, in seconds.
    #[arg(long, env = "BUOY_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// How long shutdown waits for in-flight calls, in seconds.
    #[arg(long, env = "BUOY_DRAIN_TIMEOUT_SECS", default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Allowed CORS origins, comma separated. `*` allows any.
    #[arg(long, env = "BUOY_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    /// Log output format.
    #[arg(long, env = "BUOY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Address for the Prometheus scrape endpoint. Disabled when unset.
    #[arg(long, env = "BUOY_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// PEM certificate chain. Enables TLS together with `--tls-key`.
    #[arg(long, env = "BUOY_TLS_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long, env = "BUOY_TLS_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

impl ServerArgs {
    /// Network settings derived from the arguments.
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };

        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            drain_timeout: Duration::from_secs(self.drain_timeout_secs),
        }
    }
}
