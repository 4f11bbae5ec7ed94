//! # Node Configuration
//!
//! Unified configuration for the fabric, the gateway and telemetry, read
//! from `SY_*` environment variables.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Field |
//! |----------|---------|-------|
//! | `SY_REGISTRY_ID` | `SWITCHYARD` | `fabric.registry_id` |
//! | `SY_MAX_IDLE_MS` | `30000` | `fabric.max_idle_ms` |
//! | `SY_COALESCE_DELAY_MS` | `250` | `fabric.coalesce_delay_ms` |
//! | `SY_ABANDON_TIMEOUT_MS` | `30000` | `fabric.abandon_timeout_ms` |
//! | `SY_BIND_HOST` | `127.0.0.1` | `gateway.host` |
//! | `SY_LONGPOLL_PORT` | `8008` | `gateway.longpoll_port` |
//! | `SY_INGEST_PORT` | `8004` | `gateway.ingest_port` |
//! | `SY_TEXT_HTTP_PORT` | `8003` | `gateway.text_http_port` |
//! | `SY_LINE_PORT` | `8002` | `gateway.line_port` |
//! | `SY_ADMIN_PORT` | `8080` | `gateway.admin_port` |
//! | `SY_LONGPOLL_PREFIX` | empty | `gateway.longpoll_prefix` |
//! | `SY_MAX_LINE_LENGTH` | `65536` | `gateway.max_line_length` |
//! | `SY_REQUEST_TIMEOUT_MS` | `10000` | `gateway.request_timeout_ms` |
//! | `SY_LOG_TRAFFIC` | `false` | `gateway.log_traffic` |
//!
//! Telemetry variables are documented on [`TelemetryConfig`]. A port of `0`
//! disables that listener. Values that do not parse are logged and ignored.

use shared_bus::FabricConfig;
use std::env;
use std::str::FromStr;
use switchyard_gateway::GatewayConfig;
use switchyard_telemetry::TelemetryConfig;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Identity prefix and session timing.
    pub fabric: FabricConfig,
    /// Listener ports and request limits.
    pub gateway: GatewayConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            telemetry: TelemetryConfig::from_lookup(&lookup),
            ..Self::default()
        };

        let fabric = &mut config.fabric;
        if let Some(id) = lookup("SY_REGISTRY_ID") {
            if id.is_empty() || id.contains('/') {
                warn!(var = "SY_REGISTRY_ID", value = %id, "Ignoring invalid registry id");
            } else {
                fabric.registry_id = id;
            }
        }
        set(&lookup, "SY_MAX_IDLE_MS", &mut fabric.max_idle_ms);
        set(&lookup, "SY_COALESCE_DELAY_MS", &mut fabric.coalesce_delay_ms);
        set(&lookup, "SY_ABANDON_TIMEOUT_MS", &mut fabric.abandon_timeout_ms);

        let gateway = &mut config.gateway;
        set(&lookup, "SY_BIND_HOST", &mut gateway.host);
        set(&lookup, "SY_LONGPOLL_PORT", &mut gateway.longpoll_port);
        set(&lookup, "SY_INGEST_PORT", &mut gateway.ingest_port);
        set(&lookup, "SY_TEXT_HTTP_PORT", &mut gateway.text_http_port);
        set(&lookup, "SY_LINE_PORT", &mut gateway.line_port);
        set(&lookup, "SY_ADMIN_PORT", &mut gateway.admin_port);
        set(&lookup, "SY_MAX_LINE_LENGTH", &mut gateway.max_line_length);
        set(&lookup, "SY_REQUEST_TIMEOUT_MS", &mut gateway.request_timeout_ms);
        if let Some(prefix) = lookup("SY_LONGPOLL_PREFIX") {
            gateway.longpoll_prefix = prefix;
        }
        if let Some(raw) = lookup("SY_LOG_TRAFFIC") {
            match parse_flag(&raw) {
                Some(flag) => gateway.log_traffic = flag,
                None => warn!(var = "SY_LOG_TRAFFIC", value = %raw, "Ignoring invalid value"),
            }
        }

        config
    }
}

/// Overwrite `field` with the parsed value of `key`, if set and valid.
fn set<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, field: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *field = value,
        Err(_) => warn!(var = key, value = %raw, "Ignoring invalid value"),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        assert_eq!(NodeConfig::from_lookup(lookup(&[])), NodeConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("SY_REGISTRY_ID", "EDGE"),
            ("SY_COALESCE_DELAY_MS", "0"),
            ("SY_BIND_HOST", "0.0.0.0"),
            ("SY_LINE_PORT", "0"),
            ("SY_LONGPOLL_PREFIX", "comet/"),
            ("SY_LOG_TRAFFIC", "yes"),
            ("SY_LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.fabric.registry_id, "EDGE");
        assert_eq!(config.fabric.coalesce_delay_ms, 0);
        assert_eq!(config.gateway.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.gateway.line_port, 0);
        assert_eq!(config.gateway.longpoll_base(), "/comet/");
        assert!(config.gateway.log_traffic);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_invalid_values_ignored() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("SY_REGISTRY_ID", ""),
            ("SY_MAX_IDLE_MS", "soon"),
            ("SY_ADMIN_PORT", "70000"),
            ("SY_BIND_HOST", "localhost"),
            ("SY_LOG_TRAFFIC", "maybe"),
        ]));
        assert_eq!(config, NodeConfig::default());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
