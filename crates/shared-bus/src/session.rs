//! # Long-Poll Session
//!
//! One logical client across many physical HTTP requests.
//!
//! ## Delivery State Machine
//!
//! ```text
//!              attach (queue unflushed or first bind)
//!   Detached ───────────────────────────────────────► flush ──► Detached
//!      │  ▲                                                     (abandon armed)
//!      │  │ flush on timer
//!      │  │
//!      ▼  │       attach (nothing new)
//!   Attached-Idle ◄──────────────── Detached
//!      │ update
//!      ▼
//!   Attached-Coalescing ──(coalesce delay)──► flush
//!
//!   Detached ──(abandon timeout)──► Evicted
//! ```
//!
//! The queue is only ever appended to (`update`) or truncated from the
//! front (`confirm`). A flush serializes it without removing anything, so
//! items are redelivered until the client acknowledges them.

use crate::config::FabricConfig;
use crate::timer::{Scheduler, TimerKind, TimerSlot};
use shared_types::{Envelope, Identity, LongPollBatch, ReconnectToken};
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// A live HTTP request waiting for a response body.
///
/// Consuming `self` guarantees a request is finished at most once.
pub trait PollResponder: Send {
    fn respond(self: Box<Self>, batch: LongPollBatch);
}

impl PollResponder for oneshot::Sender<LongPollBatch> {
    fn respond(self: Box<Self>, batch: LongPollBatch) {
        // The client hung up; the items stay queued until confirmed
        let _ = self.send(batch);
    }
}

/// What a fired timer did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Stale or cancelled timer.
    Ignored,
    /// Flush timer fired; `true` if a batch was actually sent.
    Flushed(bool),
    /// Abandon timer fired; the session must be evicted.
    Abandoned,
}

/// Queue, attached request and timers of one long-poll client.
pub struct Session {
    identity: Identity,
    queue: Vec<Envelope>,
    request: Option<Box<dyn PollResponder>>,
    /// A coalescing timer is pending.
    flush_pending: bool,
    /// The queue holds items a flush has not carried yet, or items left
    /// after a partial confirm.
    unflushed: bool,
    has_flushed: bool,
    flush_timer: TimerSlot,
    abandon_timer: TimerSlot,
}

impl Session {
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            queue: Vec::new(),
            request: None,
            flush_pending: false,
            unflushed: false,
            has_flushed: false,
            flush_timer: TimerSlot::default(),
            abandon_timer: TimerSlot::default(),
        }
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Pending envelopes in delivery order.
    #[must_use]
    pub fn queue(&self) -> &[Envelope] {
        &self.queue
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.request.is_some()
    }

    #[must_use]
    pub fn flush_pending(&self) -> bool {
        self.flush_pending
    }

    #[must_use]
    pub fn has_unflushed(&self) -> bool {
        self.unflushed
    }

    #[must_use]
    pub fn abandon_armed(&self) -> bool {
        self.abandon_timer.is_armed()
    }

    /// The session's `update`: queue the envelope, and start the coalescing
    /// timer unless one is already pending.
    ///
    /// The timer starts whether or not a request is attached; a flush with
    /// nothing attached is a no-op and the next attach flushes instead. A
    /// zero coalescing delay flushes on the spot. Returns `true` if a batch
    /// was sent.
    pub fn append<S: Scheduler + ?Sized>(
        &mut self,
        path: &str,
        message: &str,
        scheduler: &mut S,
        config: &FabricConfig,
    ) -> bool {
        self.queue.push(Envelope::new(path, message));
        self.unflushed = true;
        trace!(identity = %self.identity, path = %path, queued = self.queue.len(), "Queued");

        if self.flush_pending {
            return false;
        }
        if config.coalesce_delay().is_zero() {
            return self.flush(scheduler, config);
        }
        self.flush_timer.arm(
            scheduler,
            config.coalesce_delay(),
            &self.identity,
            TimerKind::Flush,
        );
        self.flush_pending = true;
        false
    }

    /// Bind a live request. Returns `true` if it was answered immediately.
    ///
    /// A request already bound is superseded: it is finished with an empty
    /// batch whose token confirms nothing.
    pub fn attach<S: Scheduler + ?Sized>(
        &mut self,
        responder: Box<dyn PollResponder>,
        scheduler: &mut S,
        config: &FabricConfig,
    ) -> bool {
        self.abandon_timer.disarm();

        if let Some(previous) = self.request.replace(responder) {
            debug!(identity = %self.identity, "Superseding attached request");
            previous.respond(LongPollBatch {
                updates: Vec::new(),
                reconnect_with: ReconnectToken::new(self.identity.clone(), 0).to_string(),
            });
        }

        if self.unflushed || !self.has_flushed {
            return self.flush(scheduler, config);
        }

        // Idle timer takes over the flush slot
        self.flush_timer.arm(
            scheduler,
            config.max_idle(),
            &self.identity,
            TimerKind::Flush,
        );
        self.flush_pending = false;
        false
    }

    /// Send the whole queue to the attached request, if there is one.
    pub fn flush<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        config: &FabricConfig,
    ) -> bool {
        self.flush_pending = false;
        self.flush_timer.disarm();

        let Some(request) = self.request.take() else {
            trace!(identity = %self.identity, "Flush with no request attached");
            return false;
        };

        let batch = LongPollBatch {
            updates: self.queue.clone(),
            reconnect_with: ReconnectToken::new(self.identity.clone(), self.queue.len())
                .to_string(),
        };
        debug!(identity = %self.identity, items = batch.updates.len(), "Flushing");
        request.respond(batch);

        self.unflushed = false;
        self.has_flushed = true;
        self.abandon_timer.arm(
            scheduler,
            config.abandon_timeout(),
            &self.identity,
            TimerKind::Abandon,
        );
        true
    }

    /// Drop the first `count` items. Returns how many were dropped.
    pub fn confirm(&mut self, count: usize) -> usize {
        let count = count.min(self.queue.len());
        self.queue.drain(..count);
        self.unflushed = !self.queue.is_empty();
        count
    }

    /// Handle a fired timer of this session.
    pub fn on_timer<S: Scheduler + ?Sized>(
        &mut self,
        kind: TimerKind,
        generation: u64,
        scheduler: &mut S,
        config: &FabricConfig,
    ) -> TimerOutcome {
        match kind {
            TimerKind::Flush if self.flush_timer.fire(generation) => {
                TimerOutcome::Flushed(self.flush(scheduler, config))
            }
            TimerKind::Abandon if self.abandon_timer.fire(generation) => TimerOutcome::Abandoned,
            _ => TimerOutcome::Ignored,
        }
    }

    /// Cancel both timers. Called on eviction.
    pub fn close(&mut self) {
        self.flush_timer.disarm();
        self.abandon_timer.disarm();
        self.flush_pending = false;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("queued", &self.queue.len())
            .field("attached", &self.request.is_some())
            .field("flush_pending", &self.flush_pending)
            .field("unflushed", &self.unflushed)
            .field("has_flushed", &self.has_flushed)
            .finish_non_exhaustive()
    }
}
