//! Metric and parameter definitions
//!
//! Parameters are positional: their declaration order is the order in which
//! converted values are bound to `?` placeholders in the query text.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    /// Passed through unchanged
    #[serde(rename = "string")]
    String,
    /// Base-10 signed 64-bit integer
    #[serde(rename = "int", alias = "integer")]
    Integer,
    /// 64-bit float, decimal or exponential notation
    #[serde(rename = "float")]
    Float,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
        }
    }
}

/// A single positional parameter of a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    /// Name matched against request inputs
    pub name: String,
    /// Type the raw input string is converted to
    #[serde(rename = "type")]
    pub kind: ParameterType,
    /// Whether the caller must supply the parameter
    #[serde(default)]
    pub required: bool,
}

impl ParameterDeclaration {
    pub fn new(name: impl Into<String>, kind: ParameterType, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
        }
    }

    pub fn required(name: impl Into<String>, kind: ParameterType) -> Self {
        Self::new(name, kind, true)
    }

    /// Check the declaration as part of `metric`
    pub fn validate(&self, metric: &str) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config(format!(
                "invalid metric {}: parameter name cannot be empty",
                metric
            )));
        }
        Ok(())
    }
}

/// A named query with its result shape and parameter contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Unique metric name
    pub name: String,
    /// SQL text with zero or more `?` placeholders
    pub query: String,
    /// Tabular metrics return every row; scalar metrics return one value
    #[serde(rename = "multi_row", default)]
    pub tabular: bool,
    /// Positional parameters in placeholder order
    #[serde(rename = "params", default)]
    pub parameters: Vec<ParameterDeclaration>,
}

impl MetricDefinition {
    /// Create a scalar metric with no parameters
    pub fn scalar(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            tabular: false,
            parameters: Vec::new(),
        }
    }

    /// Create a tabular metric with no parameters
    pub fn tabular(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            tabular: true,
            ..Self::scalar(name, query)
        }
    }

    /// Append a parameter declaration
    pub fn with_parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Find a parameter declaration by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterDeclaration> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check the definition in isolation.
    ///
    /// Placeholder count is not compared against the parameter list; a
    /// mismatch is reported by the database when the query runs.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("metric name cannot be empty".to_string()));
        }
        if self.query.trim().is_empty() {
            return Err(Error::Config(format!(
                "invalid metric {}: metric query cannot be empty",
                self.name
            )));
        }

        for (idx, parameter) in self.parameters.iter().enumerate() {
            parameter.validate(&self.name)?;
            if self.parameters[..idx].iter().any(|p| p.name == parameter.name) {
                return Err(Error::Config(format!(
                    "invalid metric {}: duplicate parameter name {}",
                    self.name, parameter.name
                )));
            }
        }

        Ok(())
    }
}
