//! Request input validation and conversion
//!
//! Inputs arrive as strings keyed by parameter name. Each declared parameter
//! is converted to its declared type and appended in declaration order, which
//! must match placeholder order in the query text.

use crate::gateway::ParameterValue;
use crate::schema::{MetricDefinition, ParameterType};
use crate::{Error, Result};
use std::collections::HashMap;

/// Convert one raw input to `kind`. Returns `None` if it does not parse.
pub fn convert_value(raw: &str, kind: ParameterType) -> Option<ParameterValue> {
    match kind {
        ParameterType::String => Some(ParameterValue::Text(raw.to_string())),
        ParameterType::Integer => raw.parse::<i64>().ok().map(ParameterValue::Integer),
        ParameterType::Float => raw.parse::<f64>().ok().map(ParameterValue::Float),
    }
}

/// Build the positional argument list for `metric` from `inputs`.
///
/// An omitted optional parameter is rejected rather than defaulted: the
/// query's placeholders are fixed and cannot be skipped.
pub fn bind_parameters(
    metric: &MetricDefinition,
    inputs: &HashMap<String, String>,
) -> Result<Vec<ParameterValue>> {
    let mut args = Vec::with_capacity(metric.parameters.len());

    for declaration in &metric.parameters {
        let Some(raw) = inputs.get(&declaration.name) else {
            return Err(if declaration.required {
                Error::MissingParameter {
                    metric: metric.name.clone(),
                    param: declaration.name.clone(),
                }
            } else {
                Error::UnsupportedOptionalParameter {
                    metric: metric.name.clone(),
                    param: declaration.name.clone(),
                }
            });
        };

        let value = convert_value(raw, declaration.kind).ok_or_else(|| {
            Error::ParameterConversion {
                metric: metric.name.clone(),
                param: declaration.name.clone(),
                raw: raw.clone(),
                expected: declaration.kind,
            }
        })?;
        args.push(value);
    }

    Ok(args)
}
