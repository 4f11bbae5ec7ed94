//! Node configuration.

pub mod config;

pub use config::NodeConfig;
