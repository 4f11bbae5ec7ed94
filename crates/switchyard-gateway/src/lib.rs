//! # Switchyard Gateway
//!
//! Transport adapters between the outside world and a running fabric.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       SWITCHYARD GATEWAY                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Long-poll   Ingest     Text HTTP   Line TCP    Admin             │
//! │  :8008       :8004      :8003       :8002       :8080             │
//! │  GET token   POST [..]  GET p;m     p;m lines   health/stats/...  │
//! │     │           │          │           │                          │
//! │     └───────────┴──────────┴─────┬─────┘                          │
//! │                                  │ FabricHandle                   │
//! └──────────────────────────────────┼───────────────────────────────┘
//!                                    ▼
//!                             fabric worker
//! ```
//!
//! Every adapter is an axum router or a TCP accept loop holding a cloned
//! [`shared_bus::FabricHandle`]; none of them owns fabric state.
//!
//! # Usage
//!
//! ```ignore
//! let gateway = Gateway::new(GatewayConfig::default(), handle)?;
//! for listener in gateway.bind().await? {
//!     listener.spawn(shutdown.clone());
//! }
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod admin;
pub mod client;
pub mod domain;
pub mod ingest;
pub mod line;
pub mod longpoll;
pub mod middleware;
pub mod protocol;
pub mod service;
pub mod text_http;
pub mod traffic;

pub use client::{ClientError, LongPollClient, PublishClient};
pub use domain::{ConfigError, Endpoint, GatewayConfig, GatewayError};
pub use line::LinePeer;
pub use service::{BoundListener, Gateway};
pub use traffic::TrafficLogger;
