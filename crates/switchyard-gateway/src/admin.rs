//! # Admin Server
//!
//! ```text
//! GET /health    {"status":"ok"}
//! GET /stats     {"peers":..,"sessions":..,"topics":..,"subscriptions":..}
//! GET /metrics   Prometheus text format
//! ```

use crate::domain::error::GatewayError;
use crate::middleware::with_timeout;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use shared_bus::{FabricHandle, FabricStats};
use std::time::Duration;
use tracing::error;

#[derive(Clone)]
struct AdminState {
    fabric: FabricHandle,
}

/// Build Admin router
pub fn build_admin_router(fabric: FabricHandle, timeout: Duration) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))
        .with_state(AdminState { fabric });
    with_timeout(router, timeout)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn stats(State(state): State<AdminState>) -> Result<Json<FabricStats>, GatewayError> {
    Ok(Json(state.fabric.stats().await?))
}

async fn metrics() -> impl IntoResponse {
    match switchyard_telemetry::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
