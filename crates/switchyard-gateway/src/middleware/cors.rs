//! CORS for browser long-poll clients.
//!
//! Browser clients are usually served from a different origin than the
//! fabric, so every HTTP adapter answers preflights permissively.

use axum::http::Method;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Preflight cache lifetime.
const MAX_AGE: Duration = Duration::from_secs(3600);

/// Create the CORS layer shared by the HTTP adapters.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(MAX_AGE)
}
