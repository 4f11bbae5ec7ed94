//! # Text-Protocol HTTP Endpoint
//!
//! `GET /<urlencoded "path;message">` publishes one update, for producers
//! that can only issue plain HTTP requests (see `PublishClient`).

use crate::domain::error::GatewayError;
use crate::middleware::with_timeout;
use crate::protocol;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shared_bus::FabricHandle;
use shared_types::Source;
use std::time::Duration;
use switchyard_telemetry::metric_inc;
use switchyard_telemetry::metrics::GATEWAY_REQUESTS;
use tracing::{debug, warn};

/// Body of every text-endpoint response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentReply {
    pub sent: bool,
}

#[derive(Clone)]
struct TextState {
    fabric: FabricHandle,
}

pub fn build_text_router(fabric: FabricHandle, timeout: Duration) -> Router {
    let router = Router::new()
        .route("/", get(publish))
        .route("/*request", get(publish))
        .with_state(TextState { fabric });
    with_timeout(router, timeout)
}

async fn publish(
    State(state): State<TextState>,
    uri: Uri,
) -> Result<(StatusCode, Json<SentReply>), GatewayError> {
    metric_inc!(GATEWAY_REQUESTS, &["text_http"]);

    let raw = uri.path().strip_prefix('/').unwrap_or(uri.path());
    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "Request path is not UTF-8");
            return Ok(rejected());
        }
    };

    let Some((path, message)) = protocol::parse_line(&decoded)
        .filter(|(path, _)| !path.is_empty())
    else {
        warn!(request = %decoded, "Ignoring update without a path");
        return Ok(rejected());
    };

    debug!(path = %path, "Text update");
    state
        .fabric
        .update(Source::Transport("text-http"), path, message)?;
    Ok((StatusCode::OK, Json(SentReply { sent: true })))
}

fn rejected() -> (StatusCode, Json<SentReply>) {
    (StatusCode::BAD_REQUEST, Json(SentReply { sent: false }))
}
