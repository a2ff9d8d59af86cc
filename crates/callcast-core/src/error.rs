//! Error types for the hub crate.

use thiserror::Error;

/// Reasons a message could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The subscriber's connection is gone.
    #[error("subscriber closed")]
    Closed,
    /// The subscriber is not draining its queue.
    #[error("subscriber queue full")]
    Full,
}
