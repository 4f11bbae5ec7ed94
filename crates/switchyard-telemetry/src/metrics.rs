//! Prometheus metrics for the Switchyard fabric and gateway.
//!
//! All metrics follow the naming convention: `sy_<component>_<metric>[_total]`
//!
//! ## Metric Types
//!
//! - **Counter**: monotonically increasing (e.g. `sy_fabric_updates_total`)
//! - **Gauge**: current size of fabric state (e.g. `sy_sessions_active`)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // FABRIC
    // =========================================================================

    /// Updates entering the fabric from transports
    pub static ref FABRIC_UPDATES: Counter = Counter::new(
        "sy_fabric_updates_total",
        "Total number of updates received by the registry"
    ).expect("metric creation failed");

    /// Deliveries produced by the dispatcher
    pub static ref DISPATCHER_DELIVERIES: Counter = Counter::new(
        "sy_dispatcher_deliveries_total",
        "Total deliveries made by the topic dispatcher"
    ).expect("metric creation failed");

    /// Current (identity, path) subscriptions
    pub static ref DISPATCHER_SUBSCRIPTIONS: Gauge = Gauge::new(
        "sy_dispatcher_subscriptions",
        "Number of live subscriptions"
    ).expect("metric creation failed");

    /// Registered identities
    pub static ref REGISTRY_PEERS: Gauge = Gauge::new(
        "sy_registry_peers",
        "Number of registered peers"
    ).expect("metric creation failed");

    // =========================================================================
    // LONG-POLL SESSIONS
    // =========================================================================

    pub static ref SESSIONS_ACTIVE: Gauge = Gauge::new(
        "sy_sessions_active",
        "Number of live long-poll sessions"
    ).expect("metric creation failed");

    pub static ref SESSIONS_EVICTED: Counter = Counter::new(
        "sy_sessions_evicted_total",
        "Total long-poll sessions evicted after abandonment"
    ).expect("metric creation failed");

    /// Flushes by trigger
    pub static ref SESSION_FLUSHES: CounterVec = CounterVec::new(
        Opts::new("sy_session_flushes_total", "Total long-poll flushes"),
        &["reason"]  // reason: attach/timer
    ).expect("metric creation failed");

    // =========================================================================
    // GATEWAY
    // =========================================================================

    pub static ref GATEWAY_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("sy_gateway_requests_total", "Total requests handled by transport adapters"),
        &["endpoint"]  // endpoint: longpoll/text_http/ingest/line
    ).expect("metric creation failed");
}

/// Handle to the metrics registry
#[derive(Clone)]
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Fabric
        Box::new(FABRIC_UPDATES.clone()),
        Box::new(DISPATCHER_DELIVERIES.clone()),
        Box::new(DISPATCHER_SUBSCRIPTIONS.clone()),
        Box::new(REGISTRY_PEERS.clone()),
        // Sessions
        Box::new(SESSIONS_ACTIVE.clone()),
        Box::new(SESSIONS_EVICTED.clone()),
        Box::new(SESSION_FLUSHES.clone()),
        // Gateway
        Box::new(GATEWAY_REQUESTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
