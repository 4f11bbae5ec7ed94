//! # Reserved Paths
//!
//! Paths starting with `::` are control channels. Application topics must
//! avoid that prefix by convention; nothing enforces it.
//!
//! | Path | Message | Emitted by |
//! |------|---------|------------|
//! | `::connect` | `<id>-><topic>` | any publisher |
//! | `::disconnect` | `<id>-><topic>` | any publisher |
//! | `::gone` | `<id>` | registry, on unregister |
//! | `::+::disconnect` | `<topic>` | dispatcher, to the unsubscribed peer |
//! | `::+::identity` | `<id>` | line adapter, greeting a new connection |

/// Subscribe `<id>` to `<topic>`.
pub const CONNECT: &str = "::connect";

/// Unsubscribe `<id>` from `<topic>`.
pub const DISCONNECT: &str = "::disconnect";

/// An identity was unregistered; its subscriptions must be dropped.
pub const GONE: &str = "::gone";

/// Sent to a peer after it has been unsubscribed from a topic.
pub const UNSUBSCRIBED: &str = "::+::disconnect";

/// Tells a freshly connected stream peer which identity it was given.
pub const IDENTITY: &str = "::+::identity";

/// Separator between identity and topic in connect/disconnect messages.
pub const CONTROL_SEPARATOR: &str = "->";

/// Prefix shared by every reserved path.
pub const RESERVED_PREFIX: &str = "::";

/// Whether `path` is in the reserved `::` namespace.
#[must_use]
pub fn is_reserved(path: &str) -> bool {
    path.starts_with(RESERVED_PREFIX)
}

/// Build a connect/disconnect message body.
#[must_use]
pub fn control_message(identity: &str, topic: &str) -> String {
    format!("{identity}{CONTROL_SEPARATOR}{topic}")
}

/// Split a connect/disconnect message into `(identity, topic)`.
///
/// Returns `None` unless the message contains exactly one `->`.
#[must_use]
pub fn parse_control(message: &str) -> Option<(&str, &str)> {
    let mut parts = message.split(CONTROL_SEPARATOR);
    let identity = parts.next()?;
    let topic = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((identity, topic))
}
