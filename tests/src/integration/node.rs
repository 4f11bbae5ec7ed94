//! # Node Runtime
//!
//! The assembled process: fabric worker, metrics observer, listeners
//! started from startup hooks, and graceful shutdown.

#[cfg(test)]
mod tests {
    use crate::integration::harness::http;
    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_bus::{FabricConfig, FabricStats};
    use shared_types::{paths, Source};
    use std::net::TcpListener;
    use switchyard_gateway::{Endpoint, GatewayConfig};

    fn headless() -> NodeConfig {
        NodeConfig {
            fabric: FabricConfig {
                max_idle_ms: 200,
                coalesce_delay_ms: 10,
                abandon_timeout_ms: 500,
                ..FabricConfig::default()
            },
            gateway: GatewayConfig {
                longpoll_port: 0,
                ingest_port: 0,
                text_http_port: 0,
                line_port: 0,
                admin_port: 0,
                ..GatewayConfig::default()
            },
            ..NodeConfig::default()
        }
    }

    fn free_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[tokio::test]
    async fn test_headless_node_serves_handle() {
        switchyard_telemetry::register_metrics().unwrap();
        let node = NodeRuntime::start(headless()).await.unwrap();
        assert!(node.listeners().is_empty());

        let handle = node.handle();
        let first = handle.poll(None).await.unwrap();
        let id = shared_types::ReconnectToken::parse(&first.reconnect_with)
            .unwrap()
            .identity;
        handle
            .update(
                Source::System,
                paths::CONNECT,
                paths::control_message(id.as_str(), "t"),
            )
            .unwrap();
        handle.update(Source::System, "t", "m").unwrap();

        let batch = handle.poll(Some(&first.reconnect_with)).await.unwrap();
        assert_eq!(batch.updates.len(), 2);
        assert_eq!(batch.reconnect_with, format!("{id}/2"));

        let metrics = switchyard_telemetry::encode_metrics().unwrap();
        assert!(metrics.contains("sy_fabric_updates_total"));

        node.shutdown().await;
        assert!(handle.stats().await.is_err());
    }

    #[tokio::test]
    async fn test_admin_listener_started_by_hook() {
        let mut config = headless();
        config.gateway.admin_port = free_port();
        let node = NodeRuntime::start(config).await.unwrap();

        let addr = node.addr(Endpoint::Admin).unwrap();
        assert_eq!(node.listeners(), &[(Endpoint::Admin, addr)]);

        let health: serde_json::Value = reqwest::get(format!("{}/health", http(addr)))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health, serde_json::json!({"status": "ok"}));

        let stats: FabricStats = reqwest::get(format!("{}/stats", http(addr)))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats, FabricStats::default());

        node.shutdown().await;
        assert!(reqwest::get(format!("{}/health", http(addr))).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_gateway_config_fails_start() {
        let mut config = headless();
        config.gateway.max_line_length = 0;
        assert!(NodeRuntime::start(config).await.is_err());
    }
}
