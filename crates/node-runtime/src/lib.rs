//! # Node Runtime Library
//!
//! The pieces of the `switchyard` binary, exposed for integration tests.
//!
//! - `container/` - environment configuration
//! - `adapters/` - runtime implementations of fabric seams (metrics)
//! - `wiring/` - fabric construction, listener startup hooks, shutdown

#![allow(clippy::cast_precision_loss)]

pub mod adapters;
pub mod container;
pub mod wiring;

pub use container::NodeConfig;
pub use wiring::NodeRuntime;
