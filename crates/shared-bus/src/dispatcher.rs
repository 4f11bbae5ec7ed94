//! # Topic Dispatcher
//!
//! Interprets the three control paths and fans ordinary messages out to
//! the subscribers of their path.
//!
//! ## Index Invariant
//!
//! Two maps are maintained together:
//!
//! - `listeners`: path → subscriber identities (insertion-ordered)
//! - `subscriptions`: identity → subscribed paths
//!
//! `id ∈ listeners[path]` if and only if `path ∈ subscriptions[id]`, and
//! neither map holds an empty set. Every mutation touches both sides inside
//! a single `update` call.
//!
//! Subscribers are stored by identity and resolved through the registry at
//! delivery time, so a peer that has been unregistered but not yet cleaned
//! up by `::gone` is skipped rather than delivered to.

use crate::peer_ref::Delivery;
use crate::registry::Registry;
use indexmap::IndexSet;
use shared_types::{paths, Identity, Source};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Subscription indices and routing.
#[derive(Debug, Default)]
pub struct Dispatcher {
    listeners: HashMap<String, IndexSet<Identity>>,
    subscriptions: HashMap<Identity, IndexSet<String>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The dispatcher's `update`. Returns the deliveries it produces, in
    /// the order they must be made.
    pub fn update(&mut self, registry: &Registry, path: &str, message: &str) -> Vec<Delivery> {
        let mut out = Vec::new();

        match path {
            paths::CONNECT => self.connect(registry, message, &mut out),
            paths::DISCONNECT => self.disconnect(registry, message, &mut out),
            paths::GONE => self.gone(message),
            _ => {}
        }

        self.fan_out(registry, path, message, &mut out);
        out
    }

    fn connect(&mut self, registry: &Registry, message: &str, out: &mut Vec<Delivery>) {
        let Some((identity, topic)) = paths::parse_control(message) else {
            warn!(message = %message, "Dropping malformed connect");
            return;
        };
        let Some(peer) = registry.lookup(identity) else {
            debug!(identity = %identity, topic = %topic, "Connect for unknown identity");
            return;
        };

        let identity = Identity::new(identity);
        self.listeners
            .entry(topic.to_string())
            .or_default()
            .insert(identity.clone());
        self.subscriptions
            .entry(identity.clone())
            .or_default()
            .insert(topic.to_string());
        debug!(identity = %identity, topic = %topic, "Subscribed");

        out.push(Delivery::new(peer.clone(), Source::Dispatcher, topic, ""));
    }

    fn disconnect(&mut self, registry: &Registry, message: &str, out: &mut Vec<Delivery>) {
        let Some((identity, topic)) = paths::parse_control(message) else {
            warn!(message = %message, "Dropping malformed disconnect");
            return;
        };
        let Some(peer) = registry.lookup(identity) else {
            debug!(identity = %identity, topic = %topic, "Disconnect for unknown identity");
            return;
        };

        let was_subscribed = self
            .subscriptions
            .get_mut(identity)
            .is_some_and(|topics| topics.shift_remove(topic));
        if !was_subscribed {
            return;
        }

        if self.subscriptions.get(identity).is_some_and(IndexSet::is_empty) {
            self.subscriptions.remove(identity);
        }
        if let Some(set) = self.listeners.get_mut(topic) {
            set.shift_remove(identity);
            if set.is_empty() {
                self.listeners.remove(topic);
            }
        }
        debug!(identity = %identity, topic = %topic, "Unsubscribed");

        out.push(Delivery::new(
            peer.clone(),
            Source::Dispatcher,
            paths::UNSUBSCRIBED,
            topic,
        ));
    }

    fn gone(&mut self, identity: &str) {
        let Some(topics) = self.subscriptions.remove(identity) else {
            return;
        };
        for topic in &topics {
            if let Some(set) = self.listeners.get_mut(topic.as_str()) {
                set.shift_remove(identity);
                if set.is_empty() {
                    self.listeners.remove(topic.as_str());
                }
            }
        }
        debug!(identity = %identity, topics = topics.len(), "Dropped subscriptions of departed peer");
    }

    fn fan_out(&self, registry: &Registry, path: &str, message: &str, out: &mut Vec<Delivery>) {
        let Some(subscribers) = self.listeners.get(path) else {
            return;
        };
        for identity in subscribers {
            match registry.lookup(identity.as_str()) {
                Some(peer) => out.push(Delivery::new(
                    peer.clone(),
                    Source::Dispatcher,
                    path,
                    message,
                )),
                None => debug!(identity = %identity, path = %path, "Skipping stale subscriber"),
            }
        }
    }

    /// Subscribers of `path` in subscription order.
    pub fn listeners(&self, path: &str) -> impl Iterator<Item = &Identity> {
        self.listeners.get(path).into_iter().flatten()
    }

    /// Paths `identity` is subscribed to, in subscription order.
    pub fn subscriptions(&self, identity: &str) -> impl Iterator<Item = &str> {
        self.subscriptions
            .get(identity)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Whether `identity` is subscribed to `topic`.
    #[must_use]
    pub fn is_subscribed(&self, identity: &str, topic: &str) -> bool {
        self.subscriptions
            .get(identity)
            .is_some_and(|topics| topics.contains(topic))
    }

    /// Number of paths with at least one subscriber.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.listeners.len()
    }

    /// Total number of (identity, path) subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(IndexSet::len).sum()
    }

    /// Verify the two indices mirror each other and hold no empty sets.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let forward = self.listeners.iter().all(|(path, ids)| {
            !ids.is_empty()
                && ids.iter().all(|id| {
                    self.subscriptions
                        .get(id)
                        .is_some_and(|topics| topics.contains(path.as_str()))
                })
        });
        let backward = self.subscriptions.iter().all(|(id, topics)| {
            !topics.is_empty()
                && topics.iter().all(|topic| {
                    self.listeners
                        .get(topic.as_str())
                        .is_some_and(|ids| ids.contains(id))
                })
        });
        forward && backward
    }
}
