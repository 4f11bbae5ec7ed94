//! # Bulk JSON Ingest
//!
//! `POST /` with a JSON array of `{"path": ..., "message": ...}` objects.
//! Every well-formed element becomes one update, in array order; anything
//! else in the array is skipped.

use crate::domain::error::GatewayError;
use crate::middleware::with_timeout;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use shared_bus::FabricHandle;
use shared_types::{Envelope, Source};
use std::time::Duration;
use switchyard_telemetry::metric_inc;
use switchyard_telemetry::metrics::GATEWAY_REQUESTS;
use tracing::{debug, warn};

#[derive(Clone)]
struct IngestState {
    fabric: FabricHandle,
}

pub fn build_ingest_router(fabric: FabricHandle, timeout: Duration) -> Router {
    let router = Router::new()
        .route("/", post(ingest))
        .with_state(IngestState { fabric });
    with_timeout(router, timeout)
}

/// Well-formed envelopes of a request body, or `None` if it is not a JSON
/// array.
pub fn parse_batch(body: &[u8]) -> Option<Vec<Envelope>> {
    let Ok(Value::Array(items)) = serde_json::from_slice::<Value>(body) else {
        return None;
    };
    let total = items.len();
    let envelopes: Vec<Envelope> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if envelopes.len() < total {
        warn!(
            skipped = total - envelopes.len(),
            "Skipping malformed ingest items"
        );
    }
    Some(envelopes)
}

async fn ingest(
    State(state): State<IngestState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), GatewayError> {
    metric_inc!(GATEWAY_REQUESTS, &["ingest"]);

    let Some(envelopes) = parse_batch(&body) else {
        warn!(bytes = body.len(), "Ingest body is not a JSON array");
        return Ok((StatusCode::BAD_REQUEST, Json(json!({ "error": true }))));
    };

    debug!(items = envelopes.len(), "Ingesting");
    for Envelope { path, message } in envelopes {
        state
            .fabric
            .update(Source::Transport("ingest"), path, message)?;
    }
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
