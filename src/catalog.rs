//! Metric catalog
//!
//! An immutable registry of metric definitions keyed by name. The catalog is
//! built once at startup and shared behind an `Arc`; it is never mutated, so
//! concurrent resolutions read it without locking.

use crate::schema::MetricDefinition;
use crate::{Error, Result};
use std::collections::HashMap;

/// Validated, read-only mapping of metric name to definition
#[derive(Debug, Clone)]
pub struct Catalog {
    metrics: HashMap<String, MetricDefinition>,
}

impl Catalog {
    /// Build a catalog from individually validated definitions.
    ///
    /// Fails if `definitions` is empty or if two definitions share a name.
    pub fn new(definitions: Vec<MetricDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(Error::CatalogValidation(
                "no metrics defined in config".to_string(),
            ));
        }

        let mut metrics = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            if metrics.contains_key(&definition.name) {
                return Err(Error::CatalogValidation(format!(
                    "duplicate metric name: {}",
                    definition.name
                )));
            }
            metrics.insert(definition.name.clone(), definition);
        }

        Ok(Self { metrics })
    }

    /// Look up a metric by name
    pub fn lookup(&self, name: &str) -> Option<&MetricDefinition> {
        self.metrics.get(name)
    }

    /// All registered metric names, in no particular order
    pub fn names(&self) -> Vec<String> {
        self.metrics.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
