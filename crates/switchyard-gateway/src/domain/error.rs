//! Gateway error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared_types::FabricError;
use std::net::SocketAddr;
use thiserror::Error;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Server socket bind error
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Accept loop or HTTP server failure
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The fabric worker is unavailable
    #[error(transparent)]
    Fabric(#[from] FabricError),

    /// A long-poll batch could not be serialized
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<super::config::ConfigError> for GatewayError {
    fn from(e: super::config::ConfigError) -> Self {
        GatewayError::Config(e.to_string())
    }
}

impl GatewayError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Fabric(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        (self.status(), self.to_string()).into_response()
    }
}
