//! # SQLMetrics
//!
//! A configuration-driven metrics query engine: named SQL queries, declared in
//! a TOML manifest, are executed against a relational store and returned as
//! typed JSON.
//!
//! ## Architecture
//!
//! - **Gateway**: executes positional-parameter SQL against a pooled SQLite
//!   database and normalizes results into text/integer/float/null values
//! - **Catalog**: immutable, validated registry of metric definitions
//! - **Engine**: converts request inputs, dispatches by result shape, and runs
//!   batches concurrently with fail-fast cancellation
//! - **API**: thin HTTP layer mapping engine errors to status codes by kind

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod schema;
pub mod telemetry;

pub use error::{Error, ErrorKind, Result};

use std::path::PathBuf;

/// Configuration for a SQLMetrics server
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the TOML metric manifest
    pub manifest_path: PathBuf,
    /// Database gateway configuration
    pub gateway: gateway::GatewayConfig,
    /// HTTP API configuration
    pub api: api::ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("./config/metrics.toml"),
            gateway: gateway::GatewayConfig::default(),
            api: api::ApiConfig::default(),
        }
    }
}

/// Re-exports for convenience
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::engine::{MetricResult, QueryEngine};
    pub use crate::gateway::{
        Gateway, GatewayConfig, ParameterValue, ResolvedValue, Row, ScalarValue, SqliteGateway,
    };
    pub use crate::schema::{MetricDefinition, ParameterDeclaration, ParameterType};
    pub use crate::{Config, Error, ErrorKind, Result};
}
