//! # Identities and Update Sources

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque name of a registered peer.
///
/// Issued exactly once per registration by the registry and never reused.
/// The format is `<registry-id>-<32 alphanumerics>-<counter>`, but callers
/// must treat it as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap a string as an identity.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for Identity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Who issued an update.
///
/// Sources are informational: routing never depends on them, but peers may
/// use them to ignore their own echoes or to attribute traffic in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Raised by the process itself (bootstrap, tests).
    System,
    /// The identity registry, e.g. the `::gone` broadcast.
    Registry,
    /// The topic dispatcher, e.g. subscription confirmations and fan-out.
    Dispatcher,
    /// A registered peer.
    Peer(Identity),
    /// An unregistered transport adapter, named for logging.
    Transport(&'static str),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Registry => f.write_str("registry"),
            Self::Dispatcher => f.write_str("dispatcher"),
            Self::Peer(id) => write!(f, "peer:{id}"),
            Self::Transport(name) => write!(f, "transport:{name}"),
        }
    }
}
