//! Metrics HTTP API
//!
//! - `GET /metrics` lists every metric name
//! - `GET /metrics?names=a,b` resolves a batch
//! - `GET /metrics/{name}` resolves a single metric
//!
//! Every other query parameter is passed to the engine as a metric input.

use crate::api::ApiState;
use crate::engine::MetricResult;
use crate::error::ErrorKind;
use crate::gateway::{ResolvedValue, ScalarValue};
use crate::Error;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

const NAMES_PARAM: &str = "names";

/// Raw query string pairs, in request order
type QueryPairs = Vec<(String, String)>;

/// `GET /metrics` and `GET /metrics?names=...`
pub async fn get_metrics(
    State(state): State<ApiState>,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    let names_param = pairs
        .iter()
        .find(|(key, _)| key == NAMES_PARAM)
        .map(|(_, value)| value.as_str())
        .unwrap_or_default();

    if names_param.is_empty() {
        return list_metrics(&state);
    }

    let names = parse_names(names_param);
    if names.is_empty() {
        return error_message(StatusCode::BAD_REQUEST, "no valid metric names provided");
    }

    resolve_batch(&state, names, extract_inputs(&pairs)).await
}

/// `GET /metrics/{name}`
pub async fn get_metric(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(pairs): Query<QueryPairs>,
) -> Response {
    if name.is_empty() {
        return error_message(StatusCode::BAD_REQUEST, "metric name required");
    }
    resolve_batch(&state, vec![name], extract_inputs(&pairs)).await
}

fn list_metrics(state: &ApiState) -> Response {
    let mut names = state.engine.names();
    names.sort();
    let results: Vec<MetricResult> = names
        .into_iter()
        .map(|name| MetricResult {
            value: ResolvedValue::Scalar(ScalarValue::Text(name.clone())),
            name,
        })
        .collect();
    (StatusCode::OK, Json(results)).into_response()
}

async fn resolve_batch(
    state: &ApiState,
    names: Vec<String>,
    inputs: HashMap<String, String>,
) -> Response {
    let cancel = CancellationToken::new();
    // Client disconnects drop this future; the guard then cancels queries.
    let _guard = cancel.clone().drop_guard();

    let outcome = tokio::time::timeout(
        state.request_timeout,
        state.engine.resolve_many(&cancel, &names, &inputs),
    )
    .await;

    match outcome {
        Ok(Ok(results)) => (StatusCode::OK, Json(results)).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(_) => {
            cancel.cancel();
            error_response(&Error::Timeout)
        }
    }
}

/// Split a comma-separated name list, trimming whitespace and dropping empties
pub fn parse_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every query parameter except `names`; the first value of a repeated key wins
pub fn extract_inputs(pairs: &[(String, String)]) -> HashMap<String, String> {
    let mut inputs = HashMap::new();
    for (key, value) in pairs {
        if key != NAMES_PARAM {
            inputs.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    inputs
}

/// Status code for an error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Execution | ErrorKind::Startup | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &Error) -> Response {
    let kind = err.kind();
    let status = status_for(kind);

    match kind {
        ErrorKind::Execution | ErrorKind::Startup | ErrorKind::Internal => {
            error!(error = %err, status = status.as_u16(), "service error");
            error_message(status, "internal server error")
        }
        _ => {
            warn!(error = %err, status = status.as_u16(), "request rejected");
            error_message(status, &err.to_string())
        }
    }
}

fn error_message(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
