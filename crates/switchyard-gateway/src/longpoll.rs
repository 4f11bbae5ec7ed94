//! # HTTP Long-Poll Adapter
//!
//! ```text
//! GET /{prefix}          begin a session
//! GET /{prefix}{token}   resume with "<identity>/<confirm>"
//! ```
//!
//! Each request is held open until the session flushes, then answered with
//! `200 application/json` and a [`LongPollBatch`] body followed by
//! `\r\n\r\n`. A request whose client hangs up is simply dropped; its items
//! stay queued until a later poll confirms them.

use crate::domain::error::GatewayError;
use crate::middleware::with_common_layers;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use shared_bus::FabricHandle;
use shared_types::LongPollBatch;
use switchyard_telemetry::metric_inc;
use switchyard_telemetry::metrics::GATEWAY_REQUESTS;
use tracing::trace;

#[derive(Clone)]
struct LongPollState {
    fabric: FabricHandle,
}

/// Build the long-poll router mounted at `base` (`"/"` or `"/<prefix>/"`).
pub fn build_longpoll_router(fabric: FabricHandle, base: &str) -> Router {
    let state = LongPollState { fabric };
    let prefix = base.trim_matches('/');

    let router = if prefix.is_empty() {
        Router::new()
            .route("/", get(begin))
            .route("/*token", get(resume))
    } else {
        Router::new()
            .route(&format!("/{prefix}"), get(begin))
            .route(&format!("/{prefix}/"), get(begin))
            .route(&format!("/{prefix}/*token"), get(resume))
    };

    // No request timeout: a poll is held until its session flushes
    with_common_layers(router.with_state(state))
}

async fn begin(State(state): State<LongPollState>) -> Result<Response, GatewayError> {
    metric_inc!(GATEWAY_REQUESTS, &["longpoll"]);
    trace!("Long poll without token");
    let batch = state.fabric.poll(None).await?;
    batch_response(&batch)
}

async fn resume(
    State(state): State<LongPollState>,
    Path(token): Path<String>,
) -> Result<Response, GatewayError> {
    metric_inc!(GATEWAY_REQUESTS, &["longpoll"]);
    trace!(token = %token, "Long poll");
    let batch = state.fabric.poll(Some(&token)).await?;
    batch_response(&batch)
}

fn batch_response(batch: &LongPollBatch) -> Result<Response, GatewayError> {
    let body = batch.to_wire()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
