//! # Peer References
//!
//! Every participant in the fabric receives `update(source, path, message)`.
//! The registry, the dispatcher and long-poll sessions live inside the
//! fabric and are addressed by variant; everything else is a
//! [`Peer`] trait object owned by a transport.

use shared_types::{Identity, Peer, Source};
use std::fmt;
use std::sync::Arc;

/// Address of something that can receive an update.
#[derive(Clone)]
pub enum PeerRef {
    /// The identity registry (rebroadcasts to its delegates).
    Registry,
    /// The topic dispatcher.
    Dispatcher,
    /// A long-poll session owned by the session manager.
    Session(Identity),
    /// A peer implemented outside the fabric.
    Remote(Arc<dyn Peer>),
}

impl PeerRef {
    /// Wrap a transport-owned peer.
    pub fn remote(peer: impl Peer + 'static) -> Self {
        Self::Remote(Arc::new(peer))
    }
}

impl fmt::Debug for PeerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => f.write_str("Registry"),
            Self::Dispatcher => f.write_str("Dispatcher"),
            Self::Session(id) => f.debug_tuple("Session").field(id).finish(),
            Self::Remote(_) => f.write_str("Remote(..)"),
        }
    }
}

/// One pending `update` call, queued until the fabric drains it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub target: PeerRef,
    pub source: Source,
    pub path: String,
    pub message: String,
}

impl Delivery {
    pub fn new(
        target: PeerRef,
        source: Source,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            source,
            path: path.into(),
            message: message.into(),
        }
    }
}
