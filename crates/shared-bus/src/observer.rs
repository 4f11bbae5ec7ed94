//! Hooks for metrics. The fabric calls these from its worker; every method
//! defaults to doing nothing.

use serde::{Deserialize, Serialize};
use shared_types::Identity;

/// Point-in-time sizes of the fabric's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricStats {
    /// Registered identities (sessions included).
    pub peers: usize,
    /// Live long-poll sessions.
    pub sessions: usize,
    /// Paths with at least one subscriber.
    pub topics: usize,
    /// (identity, path) subscription pairs.
    pub subscriptions: usize,
}

/// What triggered a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// A poll arrived and the queue had something to send.
    Attach,
    /// The coalescing or idle timer fired.
    Timer,
}

impl FlushReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Timer => "timer",
        }
    }
}

pub trait FabricObserver: Send {
    /// An update entered the fabric from outside.
    fn update_received(&self, _path: &str) {}

    /// The dispatcher produced `count` deliveries for one update.
    fn dispatched(&self, _count: usize) {}

    fn session_created(&self, _identity: &Identity) {}

    fn session_evicted(&self, _identity: &Identity) {}

    fn session_flushed(&self, _reason: FlushReason, _items: usize) {}

    /// Called after every top-level operation.
    fn snapshot(&self, _stats: &FabricStats) {}
}

/// Observer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FabricObserver for NoopObserver {}
