//! Subscriber set and best-effort fan-out.

use crate::subscriber::Subscriber;
use callcast_protocol::{ServerMessage, SubscriberId};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of delivering one message to every subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers that accepted the message.
    pub delivered: usize,
    /// Subscribers whose send failed and were dropped from the set.
    pub reaped: Vec<SubscriberId>,
}

#[derive(Default)]
pub(crate) struct SubscriberSet {
    subscribers: HashMap<SubscriberId, Arc<dyn Subscriber>>,
}

impl SubscriberSet {
    pub(crate) fn insert(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.insert(subscriber.id(), subscriber);
    }

    pub(crate) fn remove(&mut self, id: &SubscriberId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.subscribers.len();
        self.subscribers.clear();
        dropped
    }

    /// Send to every subscriber, then remove those whose send failed.
    pub(crate) fn broadcast(&mut self, message: ServerMessage) -> BroadcastReport {
        let kind = message.kind();
        let message = Arc::new(message);
        let mut report = BroadcastReport::default();

        for (id, subscriber) in &self.subscribers {
            match subscriber.send(Arc::clone(&message)) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(
                        "dropping subscriber after failed send (subscriber_id={}, type={}, err={})",
                        id, kind, err
                    );
                    report.reaped.push(*id);
                }
            }
        }
        for id in &report.reaped {
            self.subscribers.remove(id);
        }

        debug!(
            "broadcast complete (type={}, delivered={}, reaped={})",
            kind,
            report.delivered,
            report.reaped.len()
        );
        report
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("len", &self.subscribers.len())
            .finish()
    }
}
