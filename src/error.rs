//! Error types for SQLMetrics

use crate::schema::ParameterType;
use std::fmt;

/// Result type alias for SQLMetrics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SQLMetrics
#[derive(Debug)]
pub enum Error {
    /// Catalog rejected at construction (empty or duplicate names)
    CatalogValidation(String),
    /// Requested metric is not in the catalog
    MetricNotFound { name: String },
    /// A required parameter was not supplied
    MissingParameter { metric: String, param: String },
    /// An optional parameter was not supplied; positional placeholders cannot be skipped
    UnsupportedOptionalParameter { metric: String, param: String },
    /// A supplied parameter does not parse as its declared type
    ParameterConversion {
        metric: String,
        param: String,
        raw: String,
        expected: ParameterType,
    },
    /// Scalar query matched zero rows
    NoRows,
    /// Driver or connection failure
    Execution(sqlx::Error),
    /// Gateway failure while resolving a named metric
    Metric { name: String, source: Box<Error> },
    /// Query aborted through its cancellation token
    Cancelled,
    /// Timeout
    Timeout,
    /// Configuration errors
    Config(String),
    /// Internal error
    Internal(String),
}

/// Coarse classification used by callers to map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidRequest,
    Execution,
    Cancelled,
    Timeout,
    Startup,
    Internal,
}

impl Error {
    /// Classify this error, looking through the per-metric context layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MetricNotFound { .. } => ErrorKind::NotFound,
            Error::MissingParameter { .. }
            | Error::UnsupportedOptionalParameter { .. }
            | Error::ParameterConversion { .. } => ErrorKind::InvalidRequest,
            Error::NoRows | Error::Execution(_) => ErrorKind::Execution,
            Error::Metric { source, .. } => source.kind(),
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Timeout => ErrorKind::Timeout,
            Error::CatalogValidation(_)
            | Error::Config(_) => ErrorKind::Startup,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The innermost error, with any metric context stripped.
    pub fn root(&self) -> &Error {
        match self {
            Error::Metric { source, .. } => source.root(),
            other => other,
        }
    }

    /// Short stable label for telemetry attributes.
    pub fn class(&self) -> &'static str {
        match self.root() {
            Error::CatalogValidation(_) => "catalog_validation",
            Error::MetricNotFound { .. } => "metric_not_found",
            Error::MissingParameter { .. } => "missing_parameter",
            Error::UnsupportedOptionalParameter { .. } => "unsupported_optional_parameter",
            Error::ParameterConversion { .. } => "parameter_conversion",
            Error::NoRows => "no_rows",
            Error::Execution(_) => "execution",
            Error::Metric { .. } => "metric",
            Error::Cancelled => "cancelled",
            Error::Timeout => "timeout",
            Error::Config(_) => "config",
            Error::Internal(_) => "internal",
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Execution(e) => Some(e),
            Error::Metric { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CatalogValidation(msg) => write!(f, "Invalid metric catalog: {}", msg),
            Error::MetricNotFound { name } => write!(f, "metric {:?} not found", name),
            Error::MissingParameter { metric, param } => {
                write!(f, "metric {:?}: required parameter {:?} is missing", metric, param)
            }
            Error::UnsupportedOptionalParameter { metric, param } => write!(
                f,
                "metric {:?}: optional parameter {:?} was not supplied and cannot be omitted from a positional query",
                metric, param
            ),
            Error::ParameterConversion {
                metric,
                param,
                raw,
                expected,
            } => write!(
                f,
                "metric {:?}: parameter {:?}: invalid {} value {:?}",
                metric, param, expected, raw
            ),
            Error::NoRows => write!(f, "no rows returned"),
            Error::Execution(e) => write!(f, "query failed: {}", e),
            Error::Metric { name, source } => write!(f, "metric {:?} failed: {}", name, source),
            Error::Cancelled => write!(f, "query cancelled"),
            Error::Timeout => write!(f, "Operation timed out"),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Execution(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(format!("failed to parse config file: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sees_through_metric_context() {
        let err = Error::Metric {
            name: "total_count".to_string(),
            source: Box::new(Error::NoRows),
        };
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.class(), "no_rows");
        assert!(matches!(err.root(), Error::NoRows));
    }

    #[test]
    fn test_metric_context_message() {
        let err = Error::Metric {
            name: "total_count".to_string(),
            source: Box::new(Error::NoRows),
        };
        assert_eq!(err.to_string(), "metric \"total_count\" failed: no rows returned");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_request_errors_are_invalid_request() {
        let missing = Error::MissingParameter {
            metric: "m".into(),
            param: "id".into(),
        };
        let optional = Error::UnsupportedOptionalParameter {
            metric: "m".into(),
            param: "status".into(),
        };
        let conversion = Error::ParameterConversion {
            metric: "m".into(),
            param: "id".into(),
            raw: "nope".into(),
            expected: ParameterType::Integer,
        };
        for err in [missing, optional, conversion] {
            assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{err}");
        }
    }

    #[test]
    fn test_not_found_kind() {
        let err = Error::MetricNotFound {
            name: "missing_metric".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "metric \"missing_metric\" not found");
    }
}
