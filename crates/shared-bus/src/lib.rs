//! # Shared Bus - Switchyard Message Fabric
//!
//! The core of Switchyard: an identity registry, a topic dispatcher and
//! long-poll sessions, owned together by one [`Fabric`] and driven by a
//! single worker task.
//!
//! ## Flow
//!
//! ```text
//! ┌───────────┐  update   ┌──────────┐  broadcast  ┌────────────┐
//! │ Transport │ ────────► │ Registry │ ──────────► │ Dispatcher │
//! └───────────┘           └──────────┘             └─────┬──────┘
//!                                                        │ listeners[path]
//!                                      ┌─────────────────┼──────────────┐
//!                                      ▼                 ▼              ▼
//!                                 ┌─────────┐       ┌─────────┐    ┌────────┐
//!                                 │ Session │       │ Session │    │ Remote │
//!                                 └─────────┘       └─────────┘    └────────┘
//! ```
//!
//! ## Concurrency
//!
//! Nothing in here locks. The [`Fabric`] is owned by one task
//! ([`Fabric::run`]); everything else holds a [`FabricHandle`]. Timers post
//! their events back to the same task, so every mutation of the registry,
//! the dispatcher indices and the session queues happens in sequence.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod dispatcher;
pub mod fabric;
pub mod handle;
pub mod manager;
pub mod observer;
pub mod peer_ref;
pub mod registry;
pub mod session;
pub mod timer;

pub use config::FabricConfig;
pub use dispatcher::Dispatcher;
pub use fabric::Fabric;
pub use handle::{Command, FabricHandle};
pub use manager::{Binding, SessionManager};
pub use observer::{FabricObserver, FabricStats, FlushReason, NoopObserver};
pub use peer_ref::{Delivery, PeerRef};
pub use registry::{Registry, DEFAULT_REGISTRY_ID};
pub use session::{PollResponder, Session, TimerOutcome};
pub use timer::{Scheduler, TimerEvent, TimerHandle, TimerKind, TimerSlot, TokioScheduler};

#[cfg(any(test, feature = "test-util"))]
pub use timer::ManualScheduler;
