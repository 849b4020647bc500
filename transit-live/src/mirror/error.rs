//! Mirror error types.

use crate::connection::ConnectionError;
use crate::event::DecodeError;

/// Failure to bring a mirror up to date with one event.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The event names a different entity than the mirror holds.
    #[error("update for {found} rejected by mirror of {expected}")]
    IdentityMismatch { expected: String, found: String },

    /// The event payload did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The snapshot call or a subscription delivery failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The subscription feed finished while the mirror was still open.
    #[error("subscription to {topic} ended")]
    SubscriptionEnded { topic: String },
}
