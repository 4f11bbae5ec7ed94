//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Default line-protocol and text-endpoint line limit (64 KiB).
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Listener ports and limits for every transport adapter.
///
/// A port of `0` disables that adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address shared by every listener
    pub host: IpAddr,
    /// HTTP long-poll server (default: 8008)
    pub longpoll_port: u16,
    /// Bulk JSON ingest server (default: 8004)
    pub ingest_port: u16,
    /// Text-protocol HTTP endpoint (default: 8003)
    pub text_http_port: u16,
    /// Line-protocol TCP server (default: 8002)
    pub line_port: u16,
    /// Health, stats and metrics (default: 8080)
    pub admin_port: u16,
    /// Path prefix the long-poll server is mounted under, e.g. `comet/`
    pub longpoll_prefix: String,
    /// Longest accepted protocol line in bytes
    pub max_line_length: usize,
    /// Timeout for every request except long polls, in milliseconds
    pub request_timeout_ms: u64,
    /// Log every broadcast update under the `switchyard::traffic` target
    pub log_traffic: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            longpoll_port: 8008,
            ingest_port: 8004,
            text_http_port: 8003,
            line_port: 8002,
            admin_port: 8080,
            longpoll_prefix: String::new(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            request_timeout_ms: 10_000,
            log_traffic: false,
        }
    }
}

/// One transport adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    LongPoll,
    Ingest,
    TextHttp,
    Line,
    Admin,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::LongPoll,
        Endpoint::Ingest,
        Endpoint::TextHttp,
        Endpoint::Line,
        Endpoint::Admin,
    ];

    /// Label used in logs and the `endpoint` metric label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::LongPoll => "longpoll",
            Endpoint::Ingest => "ingest",
            Endpoint::TextHttp => "text_http",
            Endpoint::Line => "line",
            Endpoint::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for endpoint in Endpoint::ALL {
            let port = self.port(endpoint);
            if port != 0 && !seen.insert(port) {
                return Err(ConfigError::DuplicatePorts(port));
            }
        }

        if self.max_line_length == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_line_length cannot be 0".into(),
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout_ms cannot be 0".into(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn port(&self, endpoint: Endpoint) -> u16 {
        match endpoint {
            Endpoint::LongPoll => self.longpoll_port,
            Endpoint::Ingest => self.ingest_port,
            Endpoint::TextHttp => self.text_http_port,
            Endpoint::Line => self.line_port,
            Endpoint::Admin => self.admin_port,
        }
    }

    /// Bind address of `endpoint`, or `None` if it is disabled.
    #[must_use]
    pub fn addr(&self, endpoint: Endpoint) -> Option<SocketAddr> {
        match self.port(endpoint) {
            0 => None,
            port => Some(SocketAddr::new(self.host, port)),
        }
    }

    /// Enabled adapters with their bind addresses, in startup order.
    #[must_use]
    pub fn enabled(&self) -> Vec<(Endpoint, SocketAddr)> {
        Endpoint::ALL
            .into_iter()
            .filter_map(|endpoint| self.addr(endpoint).map(|addr| (endpoint, addr)))
            .collect()
    }

    /// The long-poll mount point: `"/"` or `"/<prefix>/"`.
    #[must_use]
    pub fn longpoll_base(&self) -> String {
        let prefix = self.longpoll_prefix.trim_matches('/');
        if prefix.is_empty() {
            "/".to_string()
        } else {
            format!("/{prefix}/")
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port {0} is assigned to more than one listener")]
    DuplicatePorts(u16),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}
