//! # Shared Types Crate
//!
//! The vocabulary every Switchyard component speaks: identities, update
//! sources, envelopes, reserved control paths, reconnect tokens and the
//! single peer contract.
//!
//! ## Design Principles
//!
//! - **One operation**: everything is expressed as
//!   `update(source, path, message)`. Subscriptions, disconnects and
//!   garbage collection are just messages on reserved `::` paths.
//! - **Absence is normal**: lookups return `Option`, malformed input parses
//!   to `None`. Nothing in here panics on untrusted text.

pub mod envelope;
pub mod errors;
pub mod identity;
pub mod paths;
pub mod peer;
pub mod token;

pub use envelope::{Envelope, LongPollBatch};
pub use errors::FabricError;
pub use identity::{Identity, Source};
pub use peer::Peer;
pub use token::ReconnectToken;
