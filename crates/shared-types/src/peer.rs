//! # Peer Contract
//!
//! The one capability every participant offers. Inside the fabric the
//! registry, dispatcher and long-poll sessions are addressed through
//! `PeerRef` variants; anything living outside the fabric (socket
//! connections, loggers, test probes) implements this trait.

use crate::identity::Source;
use std::sync::Arc;

/// Receives `update(source, path, message)`.
///
/// Called from the fabric worker. Implementations must not block: hand the
/// data to a channel or buffer and return.
pub trait Peer: Send + Sync {
    /// Deliver one message.
    fn update(&self, source: &Source, path: &str, message: &str);
}

impl<P: Peer + ?Sized> Peer for Arc<P> {
    fn update(&self, source: &Source, path: &str, message: &str) {
        (**self).update(source, path, message);
    }
}
