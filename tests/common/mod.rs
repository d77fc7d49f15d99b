//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use sqlmetrics::gateway::{Gateway, GatewayConfig, ParameterValue, Row, ScalarValue, SqliteGateway};
use sqlmetrics::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// What a scripted query does when executed
#[derive(Debug, Clone)]
pub enum Script {
    /// Sleep, then return the value
    Value { delay: Duration, value: ScalarValue },
    /// Sleep, then fail with NoRows
    Fail { delay: Duration },
    /// Block until cancelled
    Hang,
}

/// Gateway whose behavior is keyed by query text
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: HashMap<String, Script>,
    pub calls: AtomicUsize,
    pub seen_args: Mutex<Vec<Vec<ParameterValue>>>,
    pub seen_tokens: Mutex<Vec<CancellationToken>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, script: Script) -> Self {
        self.scripts.insert(query.to_string(), script);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_args(&self) -> Vec<Vec<ParameterValue>> {
        self.seen_args.lock().unwrap().clone()
    }

    /// Tokens handed to each call, in call order
    pub fn seen_tokens(&self) -> Vec<CancellationToken> {
        self.seen_tokens.lock().unwrap().clone()
    }

    async fn run(&self, cancel: &CancellationToken, query: &str, args: &[ParameterValue]) -> Result<ScalarValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_args.lock().unwrap().push(args.to_vec());
        self.seen_tokens.lock().unwrap().push(cancel.clone());

        let script = self
            .scripts
            .get(query)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("no script for query {query}")))?;

        let work = async {
            match script {
                Script::Value { delay, value } => {
                    tokio::time::sleep(delay).await;
                    Ok(value)
                }
                Script::Fail { delay } => {
                    tokio::time::sleep(delay).await;
                    Err(Error::NoRows)
                }
                Script::Hang => std::future::pending::<Result<ScalarValue>>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = work => result,
        }
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn query_scalar(
        &self,
        cancel: &CancellationToken,
        query: &str,
        args: &[ParameterValue],
    ) -> Result<ScalarValue> {
        self.run(cancel, query, args).await
    }

    async fn query_rows(
        &self,
        cancel: &CancellationToken,
        query: &str,
        args: &[ParameterValue],
    ) -> Result<Vec<Row>> {
        let value = self.run(cancel, query, args).await?;
        let mut row = Row::new();
        row.insert("value".to_string(), value);
        Ok(vec![row])
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A SQLite file with table `t(id, v, score)` holding
/// `(7, 'x', 1.5)` and `(8, NULL, NULL)`.
pub async fn seeded_sqlite() -> (SqliteGateway, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("metrics.db");

    let gateway = SqliteGateway::connect(&GatewayConfig {
        database_path: path.to_string_lossy().into_owned(),
        max_connections: 4,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("sqlite gateway should connect");

    for statement in [
        "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT, score REAL)",
        "INSERT INTO t (id, v, score) VALUES (7, 'x', 1.5)",
        "INSERT INTO t (id, v, score) VALUES (8, NULL, NULL)",
    ] {
        sqlx::query(statement)
            .execute(gateway.pool())
            .await
            .expect("seed statement should succeed");
    }

    (gateway, dir)
}

pub fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
