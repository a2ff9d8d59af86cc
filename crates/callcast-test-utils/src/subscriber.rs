use callcast_core::{DeliveryError, Subscriber};
use callcast_protocol::{ServerMessage, SubscriberId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Subscriber that keeps every delivered message, and can be told to fail.
#[derive(Debug)]
pub struct RecordingSubscriber {
    id: SubscriberId,
    messages: Mutex<Vec<Arc<ServerMessage>>>,
    failing: AtomicBool,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            messages: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    /// A subscriber whose every send fails.
    pub fn failing() -> Arc<Self> {
        let subscriber = Self::new();
        subscriber.set_failing(true);
        subscriber
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<Arc<ServerMessage>> {
        self.messages.lock().clone()
    }

    /// Kinds of the delivered messages, in delivery order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.messages.lock().iter().map(|message| message.kind()).collect()
    }

    pub fn count_of(&self, kind: &str) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|message| message.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Subscriber for RecordingSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn send(&self, message: Arc<ServerMessage>) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        self.messages.lock().push(message);
        Ok(())
    }
}
