//! # Session Timers
//!
//! Sessions wait only on timers. Each session has one slot per
//! [`TimerKind`]; arming a slot always cancels whatever it held before, so
//! there is at most one outstanding timer per kind per session.
//!
//! A cancelled timer may still fire if it raced with its cancellation. Every
//! [`TimerEvent`] carries the slot generation it was armed with, and the
//! slot ignores events from older generations.

use shared_types::Identity;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

/// Which slot a timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Coalescing and idle timers. Both end in a flush and replace each
    /// other.
    Flush,
    /// Eviction after the client stays away too long.
    Abandon,
}

/// Posted back to the fabric when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    pub session: Identity,
    pub kind: TimerKind,
    pub generation: u64,
}

/// Cancels a scheduled timer when dropped through [`TimerHandle::cancel`].
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle whose cancellation does nothing.
    #[must_use]
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// `scheduleOnce(delay, callback)`: the callback is always "deliver this
/// event to the fabric".
pub trait Scheduler {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle;
}

/// One cancel-and-replace timer slot.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<TimerHandle>,
    generation: u64,
}

impl TimerSlot {
    /// Cancel any pending timer and schedule a new one.
    pub fn arm<S: Scheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        delay: Duration,
        session: &Identity,
        kind: TimerKind,
    ) {
        self.disarm();
        self.generation += 1;
        let event = TimerEvent {
            session: session.clone(),
            kind,
            generation: self.generation,
        };
        self.handle = Some(scheduler.schedule_once(delay, event));
    }

    /// Cancel the pending timer, if any.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// Accept a fired event. Returns `false` for stale generations or an
    /// empty slot; on `true` the slot is empty again.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.handle.is_none() || generation != self.generation {
            return false;
        }
        self.handle = None;
        true
    }
}

/// Production scheduler: one `tokio::time::sleep` task per timer, posting
/// the event back on a channel the fabric worker reads.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    events: mpsc::UnboundedSender<TimerEvent>,
}

impl TokioScheduler {
    /// Must be used from inside a Tokio runtime.
    #[must_use]
    pub fn new(events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self { events }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
        let events = self.events.clone();
        trace!(session = %event.session, kind = ?event.kind, ?delay, "Scheduling timer");
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the fabric is shutting down
            let _ = events.send(event);
        });
        let abort: AbortHandle = task.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use manual::ManualScheduler;

#[cfg(any(test, feature = "test-util"))]
mod manual {
    use super::{Scheduler, TimerEvent, TimerHandle};
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct State {
        now: Duration,
        seq: u64,
        pending: BTreeMap<(Duration, u64), TimerEvent>,
    }

    /// Virtual-clock scheduler for deterministic tests.
    ///
    /// Nothing fires on its own: the test moves the clock and hands the due
    /// events to the fabric.
    #[derive(Debug, Clone, Default)]
    pub struct ManualScheduler {
        state: Arc<Mutex<State>>,
    }

    impl ManualScheduler {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Current virtual time.
        #[must_use]
        pub fn now(&self) -> Duration {
            self.state.lock().now
        }

        /// Number of scheduled, uncancelled timers.
        #[must_use]
        pub fn pending(&self) -> usize {
            self.state.lock().pending.len()
        }

        /// Move the clock forward and return every event that came due, in
        /// deadline order.
        pub fn advance(&self, by: Duration) -> Vec<TimerEvent> {
            let target = self.now() + by;
            let mut due = Vec::new();
            while let Some(event) = self.pop_due(target) {
                due.push(event);
            }
            self.state.lock().now = target;
            due
        }

        /// Pop the earliest event due at or before `until`, moving the clock
        /// to its deadline.
        pub fn pop_due(&self, until: Duration) -> Option<TimerEvent> {
            let mut state = self.state.lock();
            let key = *state.pending.keys().next()?;
            if key.0 > until {
                return None;
            }
            state.now = state.now.max(key.0);
            state.pending.remove(&key)
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerHandle {
            let key = {
                let mut state = self.state.lock();
                state.seq += 1;
                let key = (state.now + delay, state.seq);
                state.pending.insert(key, event);
                key
            };
            let state = Arc::clone(&self.state);
            TimerHandle::new(move || {
                state.lock().pending.remove(&key);
            })
        }
    }
}
