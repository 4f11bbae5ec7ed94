//! # Fabric
//!
//! Registry, dispatcher and session manager under one owner.
//!
//! Every operation turns into [`Delivery`] values pushed onto one FIFO
//! queue, which is drained to completion before the operation returns. A
//! peer that reacts to an update therefore never re-enters another peer
//! mid-mutation, and each operation is atomic with respect to every other.
//!
//! ```text
//!  transport ──update──► Registry ──► delegates (Dispatcher, loggers…)
//!                                         │
//!                                         ▼
//!                          listeners[path] ──► Session / Remote peer
//! ```

use crate::config::FabricConfig;
use crate::dispatcher::Dispatcher;
use crate::manager::{Binding, SessionManager};
use crate::observer::{FabricObserver, FabricStats, FlushReason, NoopObserver};
use crate::peer_ref::{Delivery, PeerRef};
use crate::registry::Registry;
use crate::session::{PollResponder, TimerOutcome};
use crate::timer::{Scheduler, TimerEvent};
use shared_types::{Identity, Peer, Source};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

pub struct Fabric<S: Scheduler> {
    config: FabricConfig,
    registry: Registry,
    dispatcher: Dispatcher,
    sessions: SessionManager,
    scheduler: S,
    queue: VecDeque<Delivery>,
    observer: Box<dyn FabricObserver>,
}

impl<S: Scheduler> Fabric<S> {
    /// Build a fabric whose registry delegates to the dispatcher.
    pub fn new(config: FabricConfig, scheduler: S) -> Self {
        let mut registry = Registry::new(config.registry_id.clone());
        registry.add_delegate(PeerRef::Dispatcher);

        Self {
            sessions: SessionManager::new(config.clone()),
            config,
            registry,
            dispatcher: Dispatcher::new(),
            scheduler,
            queue: VecDeque::new(),
            observer: Box::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl FabricObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    #[must_use]
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Append a broadcast delegate after the dispatcher.
    pub fn add_delegate(&mut self, delegate: PeerRef) {
        self.registry.add_delegate(delegate);
    }

    /// See [`Registry::add_startup_hook`].
    pub fn add_startup_hook(
        &mut self,
        handle: impl Into<String>,
        hook: impl FnOnce() + Send + 'static,
    ) -> bool {
        self.registry.add_startup_hook(handle, hook)
    }

    /// Run pending startup hooks.
    pub fn start(&mut self) -> usize {
        self.registry.start()
    }

    /// `update(source, path, message)` on the registry.
    pub fn update(&mut self, source: Source, path: &str, message: &str) {
        self.observer.update_received(path);
        let deliveries = self.registry.update(&source, path, message);
        self.queue.extend(deliveries);
        self.finish();
    }

    /// Register a transport-owned peer.
    pub fn register_remote(&mut self, peer: Arc<dyn Peer>) -> Identity {
        let identity = self.registry.register(PeerRef::Remote(peer));
        self.finish();
        identity
    }

    /// Unregister any identity. Sessions are evicted. Returns `false` if the
    /// identity was not registered.
    pub fn unregister(&mut self, identity: &str) -> bool {
        let gone = if self.sessions.session(identity).is_some() {
            self.evict(identity)
        } else {
            self.registry.unregister(identity)
        };
        let removed = gone.is_some();
        self.queue.extend(gone.into_iter().flatten());
        self.finish();
        removed
    }

    /// Start a new long-poll session for `responder`.
    pub fn begin_session(&mut self, responder: Box<dyn PollResponder>) -> Binding {
        let binding = self
            .sessions
            .begin_session(&mut self.registry, &mut self.scheduler, responder);
        self.observer.session_created(&binding.identity);
        self.after_bind(&binding);
        binding
    }

    /// Resume the session named by `token`, or start a new one.
    pub fn resume_session(&mut self, token: &str, responder: Box<dyn PollResponder>) -> Binding {
        let binding =
            self.sessions
                .resume_session(&mut self.registry, &mut self.scheduler, token, responder);
        if !binding.resumed {
            self.observer.session_created(&binding.identity);
        }
        self.after_bind(&binding);
        binding
    }

    fn after_bind(&mut self, binding: &Binding) {
        if binding.flushed {
            let items = self
                .sessions
                .session(binding.identity.as_str())
                .map_or(0, |s| s.queue().len());
            self.observer.session_flushed(FlushReason::Attach, items);
        }
        self.finish();
    }

    /// Handle a fired timer. Events for evicted sessions or replaced timers
    /// are ignored.
    pub fn on_timer(&mut self, event: TimerEvent) {
        let Some(session) = self.sessions.session_mut(event.session.as_str()) else {
            trace!(session = %event.session, "Timer for departed session");
            return;
        };

        match session.on_timer(event.kind, event.generation, &mut self.scheduler, &self.config) {
            TimerOutcome::Ignored => {}
            TimerOutcome::Flushed(sent) => {
                if sent {
                    let items = session.queue().len();
                    self.observer.session_flushed(FlushReason::Timer, items);
                }
            }
            TimerOutcome::Abandoned => {
                debug!(session = %event.session, "Session abandoned");
                let gone = self.evict(event.session.as_str());
                self.queue.extend(gone.into_iter().flatten());
            }
        }
        self.finish();
    }

    fn evict(&mut self, identity: &str) -> Option<Vec<Delivery>> {
        let gone = self.sessions.evict(&mut self.registry, identity)?;
        self.observer.session_evicted(&Identity::new(identity));
        Some(gone)
    }

    #[must_use]
    pub fn stats(&self) -> FabricStats {
        FabricStats {
            peers: self.registry.len(),
            sessions: self.sessions.len(),
            topics: self.dispatcher.topic_count(),
            subscriptions: self.dispatcher.subscription_count(),
        }
    }

    fn finish(&mut self) {
        self.drain();
        self.observer.snapshot(&self.stats());
    }

    fn drain(&mut self) {
        while let Some(delivery) = self.queue.pop_front() {
            self.deliver(delivery);
        }
    }

    fn deliver(&mut self, delivery: Delivery) {
        let Delivery {
            target,
            source,
            path,
            message,
        } = delivery;

        match target {
            PeerRef::Registry => {
                let out = self.registry.update(&source, &path, &message);
                self.queue.extend(out);
            }
            PeerRef::Dispatcher => {
                let out = self.dispatcher.update(&self.registry, &path, &message);
                self.observer.dispatched(out.len());
                self.queue.extend(out);
            }
            PeerRef::Session(identity) => match self.sessions.session_mut(identity.as_str()) {
                Some(session) => {
                    if session.append(&path, &message, &mut self.scheduler, &self.config) {
                        let items = session.queue().len();
                        self.observer.session_flushed(FlushReason::Timer, items);
                    }
                }
                None => trace!(identity = %identity, path = %path, "Dropping update for departed session"),
            },
            PeerRef::Remote(peer) => peer.update(&source, &path, &message),
        }
    }
}
