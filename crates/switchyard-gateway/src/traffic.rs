//! Traffic logger: a registry delegate that logs every broadcast update.
//!
//! Enabled with `SY_LOG_TRAFFIC`; filter with
//! `SY_LOG_LEVEL=info,switchyard::traffic=off` and friends.

use crate::protocol;
use shared_types::{Peer, Source};
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct TrafficLogger;

impl Peer for TrafficLogger {
    fn update(&self, source: &Source, path: &str, message: &str) {
        info!(
            target: "switchyard::traffic",
            source = %source,
            "{}",
            protocol::format_line(path, message)
        );
    }
}
