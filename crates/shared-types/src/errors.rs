//! # Error Types
//!
//! The fabric core itself has no failure modes; malformed input and stale
//! identities are absorbed where they occur. What remains is the async
//! boundary between transports and the fabric worker.

use thiserror::Error;

/// Errors from talking to the fabric worker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FabricError {
    /// The worker has stopped and no longer accepts commands.
    #[error("fabric worker is not running")]
    Closed,

    /// The worker dropped a pending reply without answering (shutdown).
    #[error("fabric dropped the request before answering")]
    Dropped,
}
