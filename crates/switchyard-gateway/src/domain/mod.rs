//! Gateway configuration and errors.

pub mod config;
pub mod error;

pub use config::{ConfigError, Endpoint, GatewayConfig, DEFAULT_MAX_LINE_LENGTH};
pub use error::GatewayError;
