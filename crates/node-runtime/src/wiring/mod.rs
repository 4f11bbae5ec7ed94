//! # Fabric Wiring
//!
//! Builds the fabric and connects every transport adapter to it.
//!
//! ```text
//!                 ┌───────────────────────────────┐
//!  transports ───►│ Registry ──► Dispatcher       │
//!  (gateway)      │    │     └─► TrafficLogger    │
//!                 │    └── startup hooks ──► serve │
//!                 └───────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Build the fabric on a tokio scheduler, dispatcher delegated first,
//!    then the traffic logger if enabled
//! 2. Bind every enabled listener (a busy port fails startup)
//! 3. Register one startup hook per listener, keyed by its address
//! 4. Run the hooks, which spawn the servers
//! 5. Spawn the fabric worker

use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared_bus::{Fabric, FabricHandle, PeerRef, TokioScheduler};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use switchyard_gateway::{Endpoint, Gateway, GatewayError, TrafficLogger};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapters::MetricsObserver;
use crate::container::NodeConfig;

/// How long shutdown waits for servers and the worker to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type ServerTask = JoinHandle<Result<(), GatewayError>>;

/// A running fabric with its transport adapters.
pub struct NodeRuntime {
    handle: FabricHandle,
    listeners: Vec<(Endpoint, SocketAddr)>,
    servers: Arc<Mutex<Vec<ServerTask>>>,
    worker: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Build, bind and start everything `config` enables.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        info!("===========================================");
        info!("  Switchyard v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let (handle, commands) = FabricHandle::channel();
        let (timer_tx, timers) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut fabric = Fabric::new(config.fabric.clone(), TokioScheduler::new(timer_tx))
            .with_observer(MetricsObserver);
        if config.gateway.log_traffic {
            fabric.add_delegate(PeerRef::remote(TrafficLogger));
            info!("Traffic logging enabled");
        }

        let gateway = Gateway::new(config.gateway.clone(), handle.clone())
            .context("Invalid gateway configuration")?;
        let bound = gateway
            .bind()
            .await
            .context("Failed to bind listeners")?;

        let servers: Arc<Mutex<Vec<ServerTask>>> = Arc::default();
        let mut listeners = Vec::with_capacity(bound.len());
        for listener in bound {
            let endpoint = listener.endpoint();
            let addr = listener.local_addr();
            listeners.push((endpoint, addr));

            let servers = Arc::clone(&servers);
            let shutdown = shutdown_rx.clone();
            let added = fabric.add_startup_hook(addr.to_string(), move || {
                servers.lock().push(listener.spawn(shutdown));
            });
            if !added {
                warn!(endpoint = %endpoint, addr = %addr, "Listener address already hooked");
            }
        }

        let started = fabric.start();
        info!(servers = started, "Startup hooks ran");

        let worker = tokio::spawn(fabric.run(commands, timers, shutdown_rx));

        for (endpoint, addr) in &listeners {
            info!(endpoint = %endpoint, addr = %addr, "Listening");
        }

        Ok(Self {
            handle,
            listeners,
            servers,
            worker,
            shutdown_tx,
        })
    }

    /// Handle to the running fabric.
    pub fn handle(&self) -> FabricHandle {
        self.handle.clone()
    }

    /// Bound address of every started adapter.
    pub fn listeners(&self) -> &[(Endpoint, SocketAddr)] {
        &self.listeners
    }

    /// Bound address of `endpoint`, if it was started.
    pub fn addr(&self, endpoint: Endpoint) -> Option<SocketAddr> {
        self.listeners
            .iter()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, addr)| *addr)
    }

    /// Shutdown the node gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal shutdown to every server and the fabric worker
    /// 2. Wait for them to stop, up to a grace period
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        let Self {
            servers,
            worker,
            shutdown_tx,
            ..
        } = self;

        if let Err(e) = shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let servers = std::mem::take(&mut *servers.lock());
        let stopped = async move {
            for server in servers {
                match server.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "Server ended with error"),
                    Err(e) => warn!(error = %e, "Server task failed"),
                }
            }
            if let Err(e) = worker.await {
                warn!(error = %e, "Fabric worker task failed");
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, stopped).await.is_err() {
            warn!("Shutdown grace period elapsed");
        }

        info!("Shutdown complete");
    }
}
