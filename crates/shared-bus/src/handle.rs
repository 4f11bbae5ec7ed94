//! # Fabric Worker and Handle
//!
//! The fabric is confined to one task. Transports talk to it through a
//! cloneable [`FabricHandle`] that posts [`Command`]s on an unbounded
//! channel; timers post [`TimerEvent`]s on a second one. The worker handles
//! one message at a time, to completion.

use crate::fabric::Fabric;
use crate::observer::FabricStats;
use crate::timer::{Scheduler, TimerEvent};
use shared_types::{FabricError, Identity, LongPollBatch, Peer, Source};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

/// A request to the fabric worker.
pub enum Command {
    Update {
        source: Source,
        path: String,
        message: String,
    },
    Register {
        peer: Arc<dyn Peer>,
        reply: oneshot::Sender<Identity>,
    },
    Unregister {
        identity: Identity,
    },
    /// Long-poll request; `None` token begins a new session.
    Poll {
        token: Option<String>,
        responder: oneshot::Sender<LongPollBatch>,
    },
    Stats {
        reply: oneshot::Sender<FabricStats>,
    },
}

/// Cloneable, `Send` access to a running fabric.
#[derive(Debug, Clone)]
pub struct FabricHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl FabricHandle {
    /// Create a handle and the receiver [`Fabric::run`] consumes.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (commands, rx) = mpsc::unbounded_channel();
        (Self { commands }, rx)
    }

    fn send(&self, command: Command) -> Result<(), FabricError> {
        self.commands.send(command).map_err(|_| FabricError::Closed)
    }

    /// `update(source, path, message)` on the registry.
    pub fn update(
        &self,
        source: Source,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), FabricError> {
        self.send(Command::Update {
            source,
            path: path.into(),
            message: message.into(),
        })
    }

    /// Register a transport-owned peer and wait for its identity.
    pub async fn register(&self, peer: Arc<dyn Peer>) -> Result<Identity, FabricError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Register { peer, reply })?;
        rx.await.map_err(|_| FabricError::Dropped)
    }

    pub fn unregister(&self, identity: Identity) -> Result<(), FabricError> {
        self.send(Command::Unregister { identity })
    }

    /// Bind a long poll to a session and wait for its batch.
    pub async fn poll(&self, token: Option<&str>) -> Result<LongPollBatch, FabricError> {
        let (responder, rx) = oneshot::channel();
        self.send(Command::Poll {
            token: token.map(str::to_string),
            responder,
        })?;
        rx.await.map_err(|_| FabricError::Dropped)
    }

    pub async fn stats(&self) -> Result<FabricStats, FabricError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stats { reply })?;
        rx.await.map_err(|_| FabricError::Dropped)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

impl<S: Scheduler + Send> Fabric<S> {
    /// Apply one command.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Update {
                source,
                path,
                message,
            } => self.update(source, &path, &message),
            Command::Register { peer, reply } => {
                let identity = self.register_remote(peer);
                if reply.send(identity.clone()).is_err() {
                    // Caller went away before learning its identity
                    self.unregister(identity.as_str());
                }
            }
            Command::Unregister { identity } => {
                self.unregister(identity.as_str());
            }
            Command::Poll { token, responder } => {
                let responder = Box::new(responder);
                match token {
                    Some(token) => self.resume_session(&token, responder),
                    None => self.begin_session(responder),
                };
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    /// The worker loop. Returns when `shutdown` changes, its sender is
    /// dropped, or every [`FabricHandle`] is gone.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut timers: mpsc::UnboundedReceiver<TimerEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(registry_id = %self.config().registry_id, "Fabric worker started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    debug!("Fabric worker received shutdown");
                    break;
                }
                Some(event) = timers.recv() => self.on_timer(event),
                command = commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }

        let stats = self.stats();
        info!(
            peers = stats.peers,
            sessions = stats.sessions,
            "Fabric worker stopped"
        );
    }
}
