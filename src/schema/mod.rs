//! Metric definitions for SQLMetrics
//!
//! A metric is a named, pre-declared SQL query plus its parameter contract and
//! result shape. Definitions are deserialized from the TOML manifest and
//! validated individually here; set-level checks (uniqueness, non-emptiness)
//! belong to the [`Catalog`](crate::catalog::Catalog).

mod metrics;

pub use metrics::{MetricDefinition, ParameterDeclaration, ParameterType};
