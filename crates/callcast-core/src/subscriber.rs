//! Subscriber abstraction and the channel-backed implementation used by
//! network sessions.

use crate::error::DeliveryError;
use callcast_protocol::{ServerMessage, SubscriberId};
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// A sink registered with the hub for broadcast messages.
///
/// `send` is called while the hub holds its state lock, so implementations
/// must return promptly and never wait on I/O.
pub trait Subscriber: Send + Sync {
    /// Stable identity used for deregistration.
    fn id(&self) -> SubscriberId;
    /// Hand one message to the subscriber.
    fn send(&self, message: Arc<ServerMessage>) -> Result<(), DeliveryError>;
}

/// Subscriber that queues messages on a bounded channel for a connection task
/// to drain.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    id: SubscriberId,
    sender: mpsc::Sender<Arc<ServerMessage>>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiver its connection task reads from.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Arc<ServerMessage>>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let id = Uuid::new_v4();
        debug!("channel subscriber created (id={}, buffer={})", id, buffer);
        (Self { id, sender }, receiver)
    }
}

impl Subscriber for ChannelSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn send(&self, message: Arc<ServerMessage>) -> Result<(), DeliveryError> {
        self.sender.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
