//! # Switchyard Test Suite
//!
//! End-to-end flows against a real fabric worker and real listeners on
//! ephemeral ports.
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs          # TestFabric, clients, helpers
//!     ├── longpoll_http.rs    # long-poll sessions over HTTP
//!     ├── line_tcp.rs         # line protocol, cross-transport
//!     ├── ingest_flow.rs      # JSON batch ingest
//!     ├── eviction.rs         # abandon, ::gone, stale tokens
//!     ├── node.rs             # NodeRuntime start/shutdown
//!     └── reconnect_props.rs  # confirm arithmetic properties
//! ```
//!
//! ```bash
//! cargo test -p sy-tests
//! cargo test -p sy-tests integration::eviction
//! ```

#![allow(dead_code)]

pub mod integration;
