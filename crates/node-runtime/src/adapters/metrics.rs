//! Prometheus-backed fabric observer.

use shared_bus::{FabricObserver, FabricStats, FlushReason};
use shared_types::Identity;
use switchyard_telemetry::metric_inc;
use switchyard_telemetry::metrics::{
    DISPATCHER_DELIVERIES, DISPATCHER_SUBSCRIPTIONS, FABRIC_UPDATES, REGISTRY_PEERS,
    SESSIONS_ACTIVE, SESSIONS_EVICTED, SESSION_FLUSHES,
};
use tracing::debug;

/// Reports fabric activity to the global metrics registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl FabricObserver for MetricsObserver {
    fn update_received(&self, _path: &str) {
        metric_inc!(FABRIC_UPDATES);
    }

    fn dispatched(&self, count: usize) {
        DISPATCHER_DELIVERIES.inc_by(count as f64);
    }

    fn session_created(&self, identity: &Identity) {
        debug!(identity = %identity, "Session created");
    }

    fn session_evicted(&self, _identity: &Identity) {
        metric_inc!(SESSIONS_EVICTED);
    }

    fn session_flushed(&self, reason: FlushReason, _items: usize) {
        metric_inc!(SESSION_FLUSHES, &[reason.as_str()]);
    }

    fn snapshot(&self, stats: &FabricStats) {
        REGISTRY_PEERS.set(stats.peers as f64);
        SESSIONS_ACTIVE.set(stats.sessions as f64);
        DISPATCHER_SUBSCRIPTIONS.set(stats.subscriptions as f64);
    }
}
