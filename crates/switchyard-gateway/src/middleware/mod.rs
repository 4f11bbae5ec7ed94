//! Tower layers shared by the HTTP adapters.

mod cors;

pub use cors::create_cors_layer;

use axum::Router;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// CORS and request tracing.
pub fn with_common_layers(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer()),
    )
}

/// [`with_common_layers`] plus a request timeout, for every adapter that
/// answers right away.
pub fn with_timeout(router: Router, timeout: Duration) -> Router {
    with_common_layers(router.layer(TimeoutLayer::new(timeout)))
}
