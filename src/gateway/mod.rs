//! Data store gateway
//!
//! Executes parameterized SQL and normalizes whatever the driver returns into
//! a small closed value model:
//! - [`ScalarValue`]: text, 64-bit integer, 64-bit float, or null
//! - [`Row`]: column name to scalar
//! - [`ResolvedValue`]: either one scalar or a sequence of rows

mod sqlite;

pub use sqlite::SqliteGateway;

use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A single normalized column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

/// One result row of a tabular query
pub type Row = BTreeMap<String, ScalarValue>;

/// Result of resolving a metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Scalar(ScalarValue),
    Rows(Vec<Row>),
}

impl ResolvedValue {
    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            ResolvedValue::Rows(rows) => Some(rows),
            ResolvedValue::Scalar(_) => None,
        }
    }
}

/// A converted positional argument, bound in declaration order
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Database file path, or `:memory:`
    pub database_path: String,
    /// Ceiling on concurrently open connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long a query waits for a free connection
    pub acquire_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            database_path: "./data.db".to_string(),
            max_connections: 25,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Query execution against a relational store.
///
/// Implementations must tolerate many concurrent calls and abort promptly
/// with [`Error::Cancelled`] once `cancel` fires.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Run a query expected to produce one row; returns its first column.
    async fn query_scalar(
        &self,
        cancel: &CancellationToken,
        query: &str,
        args: &[ParameterValue],
    ) -> Result<ScalarValue>;

    /// Run a query and return every row. Zero rows is not an error.
    async fn query_rows(
        &self,
        cancel: &CancellationToken,
        query: &str,
        args: &[ParameterValue],
    ) -> Result<Vec<Row>>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;

    /// Release pooled connections
    async fn close(&self) -> Result<()>;
}

/// Race `fut` against `cancel`. The query future is dropped on cancellation.
pub(crate) async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
