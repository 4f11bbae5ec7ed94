//! # Envelopes
//!
//! The unit of queued data and the long-poll wire batch built from it.
//!
//! ## Wire Format
//!
//! ```text
//! {"updates":[{"path":"chat","message":"hi"}],"reconnectWith":"SWITCHYARD-…-4/1"}
//! ```
//!
//! `reconnectWith` names the session and the number of items in `updates`;
//! the client echoes it verbatim on its next poll to confirm receipt.

use serde::{Deserialize, Serialize};

/// One `{path, message}` unit of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Topic or command the message was published on.
    pub path: String,
    /// Arbitrary UTF-8 payload.
    pub message: String,
}

impl Envelope {
    /// Create a new envelope.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The body of one long-poll response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongPollBatch {
    /// Queued envelopes in delivery order.
    pub updates: Vec<Envelope>,
    /// Token to send back on the next poll, `"<identity>/<updates.len()>"`.
    #[serde(rename = "reconnectWith")]
    pub reconnect_with: String,
}

impl LongPollBatch {
    /// Delimiter written after the JSON body on the wire.
    pub const TERMINATOR: &'static str = "\r\n\r\n";

    /// Serialize as the wire body, JSON followed by [`Self::TERMINATOR`].
    ///
    /// # Errors
    ///
    /// Fails only if serde_json cannot serialize a string, which does not
    /// happen for valid UTF-8.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        let mut body = serde_json::to_string(self)?;
        body.push_str(Self::TERMINATOR);
        Ok(body)
    }
}
