//! HTTP API for metric resolution
//!
//! Translates query strings into engine calls and engine results into JSON.
//! Status codes are chosen from [`ErrorKind`](crate::error::ErrorKind), never
//! from error text.

pub mod metrics_http;
mod telemetry;

use crate::engine::QueryEngine;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// HTTP API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Upper bound on a single request's metric resolution
    pub request_timeout: Duration,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            request_timeout: Duration::from_secs(30),
            enable_cors: true,
        }
    }
}

/// Build the HTTP API router
pub fn build_http_router(engine: Arc<QueryEngine>, config: &ApiConfig) -> Router {
    use axum::middleware;
    use axum::routing::get;
    use tower_http::cors::{Any, CorsLayer};

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/metrics", get(metrics_http::get_metrics))
        .route("/metrics/:name", get(metrics_http::get_metric))
        .with_state(ApiState {
            engine,
            request_timeout: config.request_timeout,
        })
        .layer(middleware::from_fn(telemetry::http_observability_middleware));

    if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<QueryEngine>,
    pub request_timeout: Duration,
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint: the database must answer a ping
async fn ready_check(State(state): State<ApiState>) -> (StatusCode, &'static str) {
    match state.engine.gateway().ping().await {
        Ok(()) => (StatusCode::OK, "READY"),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}
