//! # Reconnect Tokens
//!
//! A long-poll client holds `"<identity>/<count>"` between requests. The
//! count is the number of items the previous response carried; echoing it
//! back acknowledges them so the session can drop them from its queue.
//!
//! The count is not a content hash: two queue states of equal length give
//! the same token. That is sound only because one client drives one
//! session at a time.

use crate::identity::Identity;
use std::fmt;

/// Parsed form of a reconnect token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectToken {
    /// The session to resume.
    pub identity: Identity,
    /// How many items at the front of the queue the client received.
    pub confirm: usize,
}

impl ReconnectToken {
    /// Create a token for `identity` acknowledging `confirm` items.
    #[must_use]
    pub fn new(identity: Identity, confirm: usize) -> Self {
        Self { identity, confirm }
    }

    /// Parse `"<identity>"` or `"<identity>/<count>"`.
    ///
    /// Returns `None` for an empty identity, a count that is not a
    /// non-negative integer, or more than one `/`. Callers treat `None` as
    /// "new client".
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut pieces = raw.split('/');
        let identity = pieces.next().filter(|id| !id.is_empty())?;
        let confirm = match pieces.next() {
            Some(count) => count.parse().ok()?,
            None => 0,
        };
        if pieces.next().is_some() {
            return None;
        }
        Some(Self::new(Identity::new(identity), confirm))
    }
}

impl fmt::Display for ReconnectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.identity, self.confirm)
    }
}
