//! Cross-crate flows: transports, fabric and sessions together.

pub mod harness;

mod eviction;
mod ingest_flow;
mod line_tcp;
mod longpoll_http;
mod node;
mod reconnect_props;
