//! SQLMetrics Server Binary
//!
//! Serves the metrics declared in a TOML manifest over HTTP.

use sqlmetrics::api::{self, ApiConfig};
use sqlmetrics::config::ComponentFactory;
use sqlmetrics::gateway::GatewayConfig;
use sqlmetrics::telemetry::Telemetry;
use sqlmetrics::{Config, Error};

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// SQLMetrics HTTP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP API port
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// SQLite database path, or :memory:
    #[arg(long, env = "DB_PATH", default_value = "./data.db")]
    db_path: String,

    /// Metric manifest path
    #[arg(long, env = "METRICS_CONFIG", default_value = "./config/metrics.toml")]
    config: PathBuf,

    /// Maximum open database connections
    #[arg(long, default_value = "25")]
    max_connections: u32,

    /// Idle database connections kept open
    #[arg(long, default_value = "5")]
    min_connections: u32,

    /// Per-request resolution timeout in seconds
    #[arg(long, default_value = "30")]
    request_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            manifest_path: self.config,
            gateway: GatewayConfig {
                database_path: self.db_path,
                max_connections: self.max_connections,
                min_connections: self.min_connections,
                ..Default::default()
            },
            api: ApiConfig {
                http_port: self.port,
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                ..Default::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("sqlmetrics-server", &args.log_level)?;

    info!("Starting SQLMetrics server");

    let config = args.into_config();
    let engine = Arc::new(ComponentFactory::create_engine(&config.manifest_path, &config.gateway).await?);

    let router = api::build_http_router(engine.clone(), &config.api);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.http_port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        http_port = config.api.http_port,
        metrics = engine.catalog().len(),
        database_path = %config.gateway.database_path,
        "HTTP server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("HTTP server error: {e}")))?;

    info!("Server shutting down");
    engine.gateway().close().await?;
    info!("Server stopped gracefully");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
