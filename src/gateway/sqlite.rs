//! SQLite gateway backed by a `sqlx` connection pool

use super::{run_cancellable, Gateway, GatewayConfig, ParameterValue, Row, ScalarValue};
use crate::{Error, Result};

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as SqlxRow, Sqlite, TypeInfo, ValueRef};
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const MEMORY_PATH: &str = ":memory:";

/// VM instructions between cancellation checks on a running statement
const INTERRUPT_CHECK_OPS: i32 = 1_000;

/// Gateway over a pooled SQLite database
#[derive(Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    /// Open the pool and verify the database is reachable
    pub async fn connect(config: &GatewayConfig) -> Result<Self> {
        let in_memory = config.database_path == MEMORY_PATH;

        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
        };

        // Every connection to :memory: opens its own empty database, so pin
        // the pool to a single long-lived connection.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections.min(config.max_connections))
        };

        // A statement interrupted by cancellation leaves its progress handler
        // behind; clear it before the connection is handed out again.
        let pool = pool_options
            .after_release(|conn, _meta| {
                Box::pin(async move {
                    conn.lock_handle().await?.remove_progress_handler();
                    Ok(true)
                })
            })
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        let gateway = Self { pool };
        gateway.ping().await?;

        info!(
            database_path = %config.database_path,
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connected to SQLite database"
        );

        Ok(gateway)
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check out a connection whose running statement is interrupted by
    /// SQLite itself once `cancel` fires, so an abandoned query releases its
    /// connection instead of running to completion.
    async fn acquire_interruptible(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PoolConnection<Sqlite>> {
        let mut conn = self.pool.acquire().await?;
        let token = cancel.clone();
        conn.lock_handle()
            .await?
            .set_progress_handler(INTERRUPT_CHECK_OPS, move || !token.is_cancelled());
        Ok(conn)
    }
}

#[async_trait]
impl Gateway for SqliteGateway {
    async fn query_scalar(
        &self,
        cancel: &CancellationToken,
        query: &str,
        args: &[ParameterValue],
    ) -> Result<ScalarValue> {
        run_cancellable(cancel, async {
            let mut conn = self.acquire_interruptible(cancel).await?;
            let row = bind_arguments(query, args)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(Error::NoRows)?;

            if row.columns().is_empty() {
                return Err(Error::Execution(sqlx::Error::ColumnIndexOutOfBounds {
                    index: 0,
                    len: 0,
                }));
            }

            decode_column(&row, 0)
        })
        .await
    }

    async fn query_rows(
        &self,
        cancel: &CancellationToken,
        query: &str,
        args: &[ParameterValue],
    ) -> Result<Vec<Row>> {
        run_cancellable(cancel, async {
            let mut conn = self.acquire_interruptible(cancel).await?;
            let rows = bind_arguments(query, args).fetch_all(&mut *conn).await?;
            debug!(rows = rows.len(), "Tabular query returned");
            rows.iter().map(decode_row).collect()
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn bind_arguments<'q>(
    query: &'q str,
    args: &'q [ParameterValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    args.iter().fold(sqlx::query(query), |query, arg| match arg {
        ParameterValue::Text(v) => query.bind(v.as_str()),
        ParameterValue::Integer(v) => query.bind(*v),
        ParameterValue::Float(v) => query.bind(*v),
    })
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    row.columns()
        .iter()
        .map(|column| Ok((column.name().to_string(), decode_column(row, column.ordinal())?)))
        .collect()
}

/// Map the stored value's runtime type (not the declared column type) onto
/// the scalar model. SQLite is dynamically typed, so this is the only
/// reliable source.
fn decode_column(row: &SqliteRow, idx: usize) -> Result<ScalarValue> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(ScalarValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => ScalarValue::Integer(row.try_get_unchecked::<i64, _>(idx)?),
        "REAL" | "NUMERIC" => ScalarValue::Float(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
            ScalarValue::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => ScalarValue::Text(row.try_get_unchecked::<String, _>(idx)?),
    };

    Ok(value)
}
