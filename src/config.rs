//! Metric manifest loading and component wiring
//!
//! The manifest is a TOML file listing every metric the server exposes:
//!
//! ```toml
//! [[metrics]]
//! name = "total_count"
//! query = "SELECT COUNT(*) FROM t"
//!
//! [[metrics]]
//! name = "rows_by_id"
//! query = "SELECT v FROM t WHERE id = ?"
//! multi_row = true
//!
//! [[metrics.params]]
//! name = "id"
//! type = "int"
//! required = true
//! ```

use crate::catalog::Catalog;
use crate::engine::QueryEngine;
use crate::gateway::{Gateway, GatewayConfig, SqliteGateway};
use crate::schema::MetricDefinition;
use crate::{Error, Result};

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Root of the manifest file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub metrics: Vec<MetricDefinition>,
}

/// Read and validate a manifest file
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<MetricDefinition>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read config file {}: {}", path.display(), e))
    })?;
    parse_manifest(&contents)
}

/// Parse and validate manifest text
pub fn parse_manifest(contents: &str) -> Result<Vec<MetricDefinition>> {
    let manifest: Manifest = toml::from_str(contents)?;
    validate_metrics(&manifest.metrics)?;
    Ok(manifest.metrics)
}

fn validate_metrics(metrics: &[MetricDefinition]) -> Result<()> {
    if metrics.is_empty() {
        return Err(Error::Config("no metrics defined in config".to_string()));
    }
    for metric in metrics {
        metric.validate()?;
    }
    Ok(())
}

pub struct ComponentFactory;

impl ComponentFactory {
    /// Load the manifest and build the catalog
    pub fn create_catalog(manifest_path: impl AsRef<Path>) -> Result<Arc<Catalog>> {
        let definitions = load_manifest(manifest_path.as_ref())?;
        let catalog = Catalog::new(definitions)?;
        info!(
            metrics = catalog.len(),
            manifest = %manifest_path.as_ref().display(),
            "Loaded metric catalog"
        );
        Ok(Arc::new(catalog))
    }

    /// Open the SQLite gateway
    pub async fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn Gateway>> {
        Ok(Arc::new(SqliteGateway::connect(config).await?))
    }

    /// Catalog and gateway wired into an engine
    pub async fn create_engine(
        manifest_path: impl AsRef<Path>,
        gateway_config: &GatewayConfig,
    ) -> Result<QueryEngine> {
        let catalog = Self::create_catalog(manifest_path)?;
        let gateway = Self::create_gateway(gateway_config).await?;
        Ok(QueryEngine::new(catalog, gateway))
    }
}
