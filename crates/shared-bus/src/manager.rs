//! # Session Manager
//!
//! Owns long-poll session lifetime: creation, lookup by reconnect token and
//! eviction. The registry owns the identity mapping; the manager keeps the
//! sessions themselves.

use crate::config::FabricConfig;
use crate::peer_ref::{Delivery, PeerRef};
use crate::registry::Registry;
use crate::session::{PollResponder, Session};
use crate::timer::Scheduler;
use shared_types::{Identity, ReconnectToken};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How a poll was bound to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub identity: Identity,
    /// `true` if the token named a live session.
    pub resumed: bool,
    /// `true` if the request was answered immediately.
    pub flushed: bool,
}

/// Live long-poll sessions by identity.
#[derive(Debug)]
pub struct SessionManager {
    config: FabricConfig,
    sessions: HashMap<Identity, Session>,
}

impl SessionManager {
    #[must_use]
    pub fn new(config: FabricConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// Create and register a session, then attach the request to it.
    pub fn begin_session<S: Scheduler + ?Sized>(
        &mut self,
        registry: &mut Registry,
        scheduler: &mut S,
        responder: Box<dyn PollResponder>,
    ) -> Binding {
        let identity = registry.register_with(|id| PeerRef::Session(id.clone()));
        info!(identity = %identity, "Session created");

        let mut session = Session::new(identity.clone());
        let flushed = session.attach(responder, scheduler, &self.config);
        self.sessions.insert(identity.clone(), session);

        Binding {
            identity,
            resumed: false,
            flushed,
        }
    }

    /// Resume the session named by `token`, confirming the count it
    /// carries, or fall back to a new session if the token is malformed or
    /// names no live session.
    pub fn resume_session<S: Scheduler + ?Sized>(
        &mut self,
        registry: &mut Registry,
        scheduler: &mut S,
        token: &str,
        responder: Box<dyn PollResponder>,
    ) -> Binding {
        let Some(parsed) = ReconnectToken::parse(token) else {
            warn!(token = %token, "Unparseable reconnect token, starting new session");
            return self.begin_session(registry, scheduler, responder);
        };

        let Some(session) = self.sessions.get_mut(&parsed.identity) else {
            debug!(identity = %parsed.identity, "Unknown session, starting new one");
            return self.begin_session(registry, scheduler, responder);
        };

        let dropped = session.confirm(parsed.confirm);
        debug!(
            identity = %parsed.identity,
            confirmed = dropped,
            remaining = session.queue().len(),
            "Session resumed"
        );
        let flushed = session.attach(responder, scheduler, &self.config);

        Binding {
            identity: parsed.identity,
            resumed: true,
            flushed,
        }
    }

    /// Remove a session and unregister it.
    ///
    /// Returns the `::gone` broadcast, or `None` if the session was already
    /// gone.
    pub fn evict(&mut self, registry: &mut Registry, identity: &str) -> Option<Vec<Delivery>> {
        let mut session = self.sessions.remove(identity)?;
        session.close();
        info!(identity = %identity, dropped = session.queue().len(), "Session evicted");
        registry.unregister(identity)
    }

    #[must_use]
    pub fn session(&self, identity: &str) -> Option<&Session> {
        self.sessions.get(identity)
    }

    pub fn session_mut(&mut self, identity: &str) -> Option<&mut Session> {
        self.sessions.get_mut(identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
