//! Fabric and listeners on ephemeral ports for integration flows.

use shared_bus::{Fabric, FabricConfig, FabricHandle, TokioScheduler};
use shared_types::{Envelope, LongPollBatch};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use switchyard_gateway::{Endpoint, Gateway, GatewayConfig, LongPollClient};
use tokio::sync::{mpsc, watch};

/// A running fabric worker. Dropping it stops the worker and every server
/// started through [`TestFabric::serve`].
pub struct TestFabric {
    pub handle: FabricHandle,
    shutdown: watch::Sender<bool>,
}

impl TestFabric {
    pub fn spawn(config: FabricConfig) -> Self {
        let (handle, commands) = FabricHandle::channel();
        let (timer_tx, timers) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let fabric = Fabric::new(config, TokioScheduler::new(timer_tx));
        tokio::spawn(fabric.run(commands, timers, shutdown_rx));
        Self { handle, shutdown }
    }

    /// Fabric with short timers so flows finish quickly.
    pub fn spawn_fast() -> Self {
        Self::spawn(FabricConfig {
            max_idle_ms: 200,
            coalesce_delay_ms: 20,
            abandon_timeout_ms: 300,
            ..FabricConfig::default()
        })
    }

    /// Serve `endpoint` on an ephemeral localhost port.
    pub async fn serve(&self, endpoint: Endpoint) -> SocketAddr {
        self.serve_with(endpoint, GatewayConfig::default()).await
    }

    pub async fn serve_with(&self, endpoint: Endpoint, config: GatewayConfig) -> SocketAddr {
        let gateway = Gateway::new(config, self.handle.clone()).unwrap();
        let bound = gateway
            .bind_endpoint(endpoint, SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .unwrap();
        let addr = bound.local_addr();
        bound.spawn(self.shutdown.subscribe());
        addr
    }
}

pub fn http(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

/// Poll until `count` updates have arrived, or fail after `deadline`.
pub async fn collect(client: &mut LongPollClient, count: usize, deadline: Duration) -> Vec<Envelope> {
    let mut updates = Vec::new();
    tokio::time::timeout(deadline, async {
        while updates.len() < count {
            let LongPollBatch { updates: batch, .. } = client.poll().await.unwrap();
            updates.extend(batch);
        }
    })
    .await
    .expect("updates arrived in time");
    updates
}
