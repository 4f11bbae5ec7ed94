//! Gateway service: binds every enabled adapter, then serves on demand.
//!
//! Binding and serving are split so a process can fail fast on a busy port
//! before anything starts, and start each server from a registry startup
//! hook afterwards.

use crate::admin::build_admin_router;
use crate::domain::config::{Endpoint, GatewayConfig};
use crate::domain::error::GatewayError;
use crate::ingest::build_ingest_router;
use crate::line;
use crate::longpoll::build_longpoll_router;
use crate::text_http::build_text_router;
use axum::Router;
use shared_bus::FabricHandle;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Transport adapters for one fabric.
pub struct Gateway {
    config: GatewayConfig,
    fabric: FabricHandle,
}

impl Gateway {
    /// Create a gateway after validating `config`.
    pub fn new(config: GatewayConfig, fabric: FabricHandle) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self { config, fabric })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Bind the listener of every enabled adapter.
    pub async fn bind(&self) -> Result<Vec<BoundListener>, GatewayError> {
        let mut bound = Vec::new();
        for (endpoint, addr) in self.config.enabled() {
            bound.push(self.bind_endpoint(endpoint, addr).await?);
        }
        Ok(bound)
    }

    /// Bind one adapter at `addr`, which may use port 0.
    pub async fn bind_endpoint(
        &self,
        endpoint: Endpoint,
        addr: SocketAddr,
    ) -> Result<BoundListener, GatewayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| GatewayError::Bind { addr, source })?;

        let fabric = self.fabric.clone();
        let timeout = self.config.request_timeout();
        let server = match endpoint {
            Endpoint::LongPoll => Server::Http(build_longpoll_router(
                fabric,
                &self.config.longpoll_base(),
            )),
            Endpoint::Ingest => Server::Http(build_ingest_router(fabric, timeout)),
            Endpoint::TextHttp => Server::Http(build_text_router(fabric, timeout)),
            Endpoint::Admin => Server::Http(build_admin_router(fabric, timeout)),
            Endpoint::Line => Server::Line {
                fabric,
                max_line_length: self.config.max_line_length,
            },
        };

        Ok(BoundListener {
            endpoint,
            local_addr,
            listener,
            server,
        })
    }
}

enum Server {
    Http(Router),
    Line {
        fabric: FabricHandle,
        max_line_length: usize,
    },
}

/// A bound, not yet serving, adapter listener.
pub struct BoundListener {
    endpoint: Endpoint,
    local_addr: SocketAddr,
    listener: TcpListener,
    server: Server,
}

impl BoundListener {
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` changes. Must be called inside a tokio
    /// runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<Result<(), GatewayError>> {
        let Self {
            endpoint,
            local_addr,
            listener,
            server,
        } = self;

        info!(endpoint = %endpoint, addr = %local_addr, "Starting server");
        tokio::spawn(async move {
            let result = match server {
                Server::Http(router) => axum::serve(listener, router)
                    .with_graceful_shutdown(wait_for_shutdown(shutdown))
                    .await
                    .map_err(GatewayError::Serve),
                Server::Line {
                    fabric,
                    max_line_length,
                } => line::serve(listener, fabric, max_line_length, shutdown).await,
            };
            match &result {
                Ok(()) => info!(endpoint = %endpoint, "Server stopped"),
                Err(e) => error!(endpoint = %endpoint, error = %e, "Server failed"),
            }
            result
        })
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    // A dropped sender counts as shutdown
    let _ = shutdown.changed().await;
}
