//! Call hub: transcript log, call table and subscriber fan-out behind one lock.
//!
//! Every public operation takes the state lock for its whole mutate-then-broadcast
//! step, so subscribers observe messages in the order the mutations happened.
//! Ended and failed calls are removed by a delayed task that only acts if the
//! call has not been updated since it was scheduled.

mod calls;
mod expiry;
mod fanout;
mod transcripts;

pub use fanout::BroadcastReport;

use crate::clock::{Clock, SystemClock};
use crate::subscriber::Subscriber;
use calls::CallTable;
use callcast_config::HubConfig;
use callcast_protocol::{
    ActiveCalls, CallSession, HubStats, InitialData, ServerMessage, SubscriberId,
    TranscriptEntry, TranscriptRecord, is_terminal_status,
};
use chrono::{DateTime, Utc};
use fanout::SubscriberSet;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use transcripts::TranscriptLog;

/// Shared handle to the session/broadcast core.
///
/// Cloning is cheap; every clone refers to the same state.
#[derive(Clone)]
pub struct CallHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    recent_window: chrono::Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<HubState>,
}

#[derive(Debug)]
struct HubState {
    transcripts: TranscriptLog,
    calls: CallTable,
    subscribers: SubscriberSet,
}

impl CallHub {
    /// Create a hub driven by the system clock.
    pub fn new(config: HubConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a hub with an explicit clock.
    pub fn with_clock(config: HubConfig, clock: Arc<dyn Clock>) -> Self {
        let recent_window = chrono::Duration::from_std(config.recent_activity_window())
            .unwrap_or(chrono::Duration::MAX);
        let state = HubState {
            transcripts: TranscriptLog::new(config.transcript_capacity),
            calls: CallTable::default(),
            subscribers: SubscriberSet::default(),
        };
        debug!(
            "call hub created (transcript_capacity={}, call_expiry_secs={})",
            config.transcript_capacity, config.call_expiry_secs
        );
        Self {
            inner: Arc::new(HubInner {
                config,
                recent_window,
                clock,
                state: Mutex::new(state),
            }),
        }
    }

    /// Hub limits and timings.
    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Current time according to the hub clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Store a transcript line and broadcast it.
    pub fn append_transcript(&self, record: TranscriptRecord) -> TranscriptEntry {
        let now = self.inner.clock.now();
        let mut state = self.inner.state.lock();
        let entry = state.transcripts.append(record, now);
        debug!(
            "transcript stored (id={}, call_id={}, role={})",
            entry.id, entry.call_id, entry.role
        );
        state
            .subscribers
            .broadcast(ServerMessage::Transcript(entry.clone()));
        entry
    }

    /// Create or update a call and broadcast its new status.
    ///
    /// A terminal status ("ended" or "failed") schedules removal of the call
    /// after the configured expiry delay; any later update cancels it.
    pub fn update_call_status(&self, call_id: &str, status: &str) -> CallSession {
        let now = self.inner.clock.now();
        let mut state = self.inner.state.lock();
        let created = !state.calls.contains(call_id);
        let (session, generation) = state.calls.upsert(call_id, status, now);
        if created {
            info!("call created (call_id={}, status={})", call_id, status);
        } else {
            debug!("call status updated (call_id={}, status={})", call_id, status);
        }
        state.subscribers.broadcast(ServerMessage::CallStatus {
            call_id: call_id.to_string(),
            session: session.clone(),
        });

        if is_terminal_status(status) {
            let weak = Arc::downgrade(&self.inner);
            let expired_id = call_id.to_string();
            let delay = self.inner.config.call_expiry();
            if let Some(handle) = expiry::schedule(delay, move || {
                expire_from_weak(&weak, &expired_id, generation);
            }) {
                state.calls.set_expiry(call_id, handle);
                debug!(
                    "call expiry scheduled (call_id={}, generation={}, delay_secs={})",
                    call_id,
                    generation,
                    delay.as_secs()
                );
            }
        }
        session
    }

    /// Remove a call if it still carries `generation`, broadcasting `call_removed`.
    pub(crate) fn expire_call(&self, call_id: &str, generation: u64) -> bool {
        let mut state = self.inner.state.lock();
        match state.calls.remove_if_current(call_id, generation) {
            Some(session) => {
                info!(
                    "call removed (call_id={}, status={})",
                    call_id, session.status
                );
                state.subscribers.broadcast(ServerMessage::CallRemoved {
                    call_id: call_id.to_string(),
                });
                true
            }
            None => {
                debug!(
                    "stale call expiry ignored (call_id={}, generation={})",
                    call_id, generation
                );
                false
            }
        }
    }

    /// Broadcast a function invocation reported by the voice agent.
    pub fn publish_function_call(
        &self,
        function_name: &str,
        parameters: Value,
    ) -> BroadcastReport {
        let timestamp = self.inner.clock.now();
        info!("function call received (function_name={})", function_name);
        self.broadcast(ServerMessage::FunctionCall {
            function_name: function_name.to_string(),
            parameters,
            timestamp,
        })
    }

    /// Broadcast that a call's conversation history changed.
    pub fn publish_conversation_update(
        &self,
        call_id: &str,
        message_count: usize,
    ) -> BroadcastReport {
        let timestamp = self.inner.clock.now();
        debug!(
            "conversation updated (call_id={}, message_count={})",
            call_id, message_count
        );
        self.broadcast(ServerMessage::ConversationUpdate {
            call_id: call_id.to_string(),
            message_count,
            timestamp,
        })
    }

    /// Deliver a message to every subscriber, dropping those that fail.
    pub fn broadcast(&self, message: ServerMessage) -> BroadcastReport {
        self.inner.state.lock().subscribers.broadcast(message)
    }

    /// Add a subscriber and send it the catch-up snapshot.
    ///
    /// Returns `false` when the snapshot could not be delivered, in which case
    /// the subscriber is not kept.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let id = subscriber.id();
        let mut state = self.inner.state.lock();
        let snapshot = InitialData {
            transcripts: state.transcripts.recent(self.inner.config.snapshot_size),
            active_calls: state.calls.snapshot(),
        };
        let transcripts = snapshot.transcripts.len();
        if let Err(err) = subscriber.send(Arc::new(ServerMessage::InitialData(snapshot))) {
            warn!(
                "subscriber dropped during registration (subscriber_id={}, err={})",
                id, err
            );
            return false;
        }
        state.subscribers.insert(subscriber);
        info!(
            "subscriber registered (subscriber_id={}, connections={}, transcripts={})",
            id,
            state.subscribers.len(),
            transcripts
        );
        true
    }

    /// Remove a subscriber; returns whether it was registered.
    pub fn deregister(&self, id: &SubscriberId) -> bool {
        let mut state = self.inner.state.lock();
        let removed = state.subscribers.remove(id);
        if removed {
            info!(
                "subscriber deregistered (subscriber_id={}, connections={})",
                id,
                state.subscribers.len()
            );
        }
        removed
    }

    /// The last `count` transcripts in append order.
    pub fn recent_transcripts(&self, count: usize) -> Vec<TranscriptEntry> {
        self.inner.state.lock().transcripts.recent(count)
    }

    /// Snapshot of every tracked call.
    pub fn active_calls(&self) -> ActiveCalls {
        self.inner.state.lock().calls.snapshot()
    }

    /// Current counters, with recent activity measured against the hub clock.
    pub fn stats(&self) -> HubStats {
        let now = self.inner.clock.now();
        let state = self.inner.state.lock();
        HubStats {
            active_connections: state.subscribers.len(),
            total_transcripts: state.transcripts.len(),
            active_calls: state.calls.len(),
            recent_activity: state.transcripts.count_since(now, self.inner.recent_window),
        }
    }

    /// Empty the transcript log and broadcast `transcripts_cleared`.
    ///
    /// Returns how many entries were removed. Calls are left untouched.
    pub fn clear_transcripts(&self) -> usize {
        let timestamp = self.inner.clock.now();
        let mut state = self.inner.state.lock();
        let cleared = state.transcripts.clear();
        info!("transcripts cleared (cleared={})", cleared);
        state.subscribers.broadcast(ServerMessage::TranscriptsCleared {
            message: "All transcripts cleared".to_string(),
            timestamp,
        });
        cleared
    }

    /// Number of registered subscribers.
    pub fn connection_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Cancel pending expiries and drop every subscriber.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        let aborted = state.calls.abort_expiries();
        let dropped = state.subscribers.clear();
        info!(
            "call hub shut down (aborted_expiries={}, dropped_subscribers={})",
            aborted, dropped
        );
    }
}

impl std::fmt::Debug for CallHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallHub")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

fn expire_from_weak(inner: &Weak<HubInner>, call_id: &str, generation: u64) {
    let Some(inner) = inner.upgrade() else {
        debug!("call expiry after hub dropped (call_id={})", call_id);
        return;
    };
    CallHub { inner }.expire_call(call_id, generation);
}
