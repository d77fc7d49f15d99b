//! Query orchestration engine
//!
//! The engine is responsible for:
//! - Looking metrics up in the [`Catalog`]
//! - Validating and converting request inputs against parameter declarations
//! - Dispatching to the [`Gateway`] by result shape
//! - Fanning batches out concurrently with fail-fast cancellation

mod params;
mod telemetry;

pub use params::{bind_parameters, convert_value};

use crate::catalog::Catalog;
use crate::gateway::{Gateway, ResolvedValue};
use crate::{Error, Result};

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

/// A resolved metric, serialized as `{"name": ..., "value": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub name: String,
    pub value: ResolvedValue,
}

/// Resolves metrics against a catalog and gateway.
///
/// Cloning is cheap; clones share the catalog and the gateway's pool.
#[derive(Clone)]
pub struct QueryEngine {
    catalog: Arc<Catalog>,
    gateway: Arc<dyn Gateway>,
}

impl QueryEngine {
    pub fn new(catalog: Arc<Catalog>, gateway: Arc<dyn Gateway>) -> Self {
        Self { catalog, gateway }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    /// Every metric name in the catalog, in no particular order
    pub fn names(&self) -> Vec<String> {
        self.catalog.names()
    }

    /// Resolve a single metric.
    ///
    /// Gateway failures are wrapped once in [`Error::Metric`]; lookup and
    /// parameter errors are returned as-is since they already name the metric.
    pub async fn resolve(
        &self,
        cancel: &CancellationToken,
        name: &str,
        inputs: &HashMap<String, String>,
    ) -> Result<MetricResult> {
        let started = Instant::now();

        let Some(metric) = self.catalog.lookup(name) else {
            telemetry::record_resolution(
                "unknown",
                None,
                Some("metric_not_found"),
                started.elapsed().as_secs_f64(),
            );
            return Err(Error::MetricNotFound {
                name: name.to_string(),
            });
        };

        let result = async {
            let args = bind_parameters(metric, inputs)?;
            debug!(args = args.len(), tabular = metric.tabular, "Executing metric query");

            let value = if metric.tabular {
                self.gateway
                    .query_rows(cancel, &metric.query, &args)
                    .await
                    .map(ResolvedValue::Rows)
            } else {
                self.gateway
                    .query_scalar(cancel, &metric.query, &args)
                    .await
                    .map(ResolvedValue::Scalar)
            };

            value.map_err(|source| Error::Metric {
                name: metric.name.clone(),
                source: Box::new(source),
            })
        }
        .instrument(info_span!("metric.resolve", metric = %metric.name))
        .await;

        telemetry::record_resolution(
            &metric.name,
            Some(metric.tabular),
            result.as_ref().err().map(Error::class),
            started.elapsed().as_secs_f64(),
        );

        Ok(MetricResult {
            name: metric.name.clone(),
            value: result?,
        })
    }

    /// Resolve several metrics concurrently.
    ///
    /// Results come back in the order of `names` (duplicates included). The
    /// first failure cancels every sibling query and is returned alone; no
    /// partial results are ever returned. Cancelling `cancel` yields
    /// [`Error::Cancelled`].
    pub async fn resolve_many(
        &self,
        cancel: &CancellationToken,
        names: &[String],
        inputs: &HashMap<String, String>,
    ) -> Result<Vec<MetricResult>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        telemetry::record_batch(names.len());

        let batch_cancel = cancel.child_token();
        let inputs = Arc::new(inputs.clone());
        let mut tasks = JoinSet::new();

        for (idx, name) in names.iter().enumerate() {
            let engine = self.clone();
            let cancel = batch_cancel.clone();
            let inputs = inputs.clone();
            let name = name.clone();
            tasks.spawn(async move {
                let result = engine.resolve(&cancel, &name, &inputs).await;
                (idx, result)
            });
        }

        let mut slots: Vec<Option<MetricResult>> = vec![None; names.len()];
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| Error::Internal(format!("metric task failed: {}", e)))
                .and_then(|(idx, result)| result.map(|r| (idx, r)));

            match outcome {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(_) if cancel.is_cancelled() => {
                    batch_cancel.cancel();
                    return Err(Error::Cancelled);
                }
                Err(error) => {
                    warn!(error = %error, batch_size = names.len(), "Metric batch failed");
                    batch_cancel.cancel();
                    // Dropping the set aborts whatever is still running.
                    return Err(error);
                }
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| Error::Internal("metric result missing".to_string())))
            .collect()
    }
}
