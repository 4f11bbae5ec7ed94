//! # Identity Registry
//!
//! Owns the identity namespace and the list of broadcast delegates.
//!
//! The registry never routes to registered peers itself. Its own `update`
//! rebroadcasts every message to its delegates in insertion order; routing
//! is the dispatcher's job.
//!
//! ## Identity Format
//!
//! ```text
//! <registry-id>-<32 random alphanumerics>-<counter>
//! ```
//!
//! The counter alone makes identities unique within one registry, so a
//! collision in the random part is harmless.

use crate::peer_ref::{Delivery, PeerRef};
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared_types::{paths, Identity, Source};
use std::collections::HashMap;
use tracing::{debug, info};

/// Default identity prefix.
pub const DEFAULT_REGISTRY_ID: &str = "SWITCHYARD";

/// Length of the random middle segment of an identity.
const RANDOM_SEGMENT_LEN: usize = 32;

type Hook = Box<dyn FnOnce() + Send>;

struct StartupHook {
    handle: String,
    hook: Option<Hook>,
}

/// Live peers by identity, broadcast delegates and startup hooks.
pub struct Registry {
    registry_id: String,
    counter: u64,
    peers: HashMap<Identity, PeerRef>,
    delegates: Vec<PeerRef>,
    hooks: Vec<StartupHook>,
}

impl Registry {
    /// Create a registry issuing identities prefixed with `registry_id`.
    pub fn new(registry_id: impl Into<String>) -> Self {
        Self {
            registry_id: registry_id.into(),
            counter: 0,
            peers: HashMap::new(),
            delegates: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// The identity prefix.
    #[must_use]
    pub fn registry_id(&self) -> &str {
        &self.registry_id
    }

    fn next_identity(&mut self) -> Identity {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_SEGMENT_LEN)
            .map(char::from)
            .collect();
        self.counter += 1;
        Identity::new(format!("{}-{}-{}", self.registry_id, random, self.counter))
    }

    /// Register a peer and return its fresh identity.
    pub fn register(&mut self, peer: PeerRef) -> Identity {
        self.register_with(|_| peer)
    }

    /// Register a peer that needs to know its own identity to be built.
    pub fn register_with(&mut self, build: impl FnOnce(&Identity) -> PeerRef) -> Identity {
        let identity = self.next_identity();
        let peer = build(&identity);
        debug!(identity = %identity, peer = ?peer, "Registered peer");
        self.peers.insert(identity.clone(), peer);
        identity
    }

    /// Remove `identity` from the registry.
    ///
    /// Returns the `::gone` broadcast to deliver, or `None` if the identity
    /// was not registered. Unregistering twice is a no-op.
    pub fn unregister(&mut self, identity: &str) -> Option<Vec<Delivery>> {
        self.peers.remove(identity)?;
        debug!(identity = %identity, "Unregistered peer");
        Some(self.update(&Source::Registry, paths::GONE, identity))
    }

    /// Resolve an identity. Absence is a normal outcome.
    #[must_use]
    pub fn lookup(&self, identity: &str) -> Option<&PeerRef> {
        self.peers.get(identity)
    }

    /// Whether `identity` is currently registered.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.peers.contains_key(identity)
    }

    /// Number of registered peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Append a delegate. Delegates see every broadcast in insertion order.
    pub fn add_delegate(&mut self, delegate: PeerRef) {
        debug!(delegate = ?delegate, position = self.delegates.len(), "Added delegate");
        self.delegates.push(delegate);
    }

    #[must_use]
    pub fn delegates(&self) -> &[PeerRef] {
        &self.delegates
    }

    /// Add a hook to run on [`Self::start`].
    ///
    /// Hooks are deduplicated by `handle`: returns `false` and drops `hook`
    /// if a hook with the same handle was already added.
    pub fn add_startup_hook(
        &mut self,
        handle: impl Into<String>,
        hook: impl FnOnce() + Send + 'static,
    ) -> bool {
        let handle = handle.into();
        if self.hooks.iter().any(|h| h.handle == handle) {
            debug!(handle = %handle, "Startup hook already registered");
            return false;
        }
        self.hooks.push(StartupHook {
            handle,
            hook: Some(Box::new(hook)),
        });
        true
    }

    /// Run every hook that has not run yet, in registration order.
    ///
    /// Returns how many hooks ran.
    pub fn start(&mut self) -> usize {
        info!(registry_id = %self.registry_id, "Starting registry");
        let mut ran = 0;
        for entry in &mut self.hooks {
            if let Some(hook) = entry.hook.take() {
                debug!(handle = %entry.handle, "Running startup hook");
                hook();
                ran += 1;
            }
        }
        ran
    }

    /// The registry's own `update`: one delivery per delegate, in order.
    #[must_use]
    pub fn update(&self, source: &Source, path: &str, message: &str) -> Vec<Delivery> {
        self.delegates
            .iter()
            .map(|delegate| Delivery::new(delegate.clone(), source.clone(), path, message))
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_ID)
    }
}
