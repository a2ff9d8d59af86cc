//! Active call table with generation-tagged expiry.

use callcast_protocol::{ActiveCalls, CallSession};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::task::AbortHandle;

#[derive(Debug)]
struct CallEntry {
    session: CallSession,
    /// Stamp of the latest upsert; expiry only removes a matching generation.
    generation: u64,
    expiry: Option<AbortHandle>,
}

/// Calls keyed by call id.
#[derive(Debug, Default)]
pub(crate) struct CallTable {
    entries: HashMap<String, CallEntry>,
    next_generation: u64,
}

impl CallTable {
    /// Create or update a call, cancelling any pending expiry for it.
    ///
    /// Returns the resulting session and its new generation.
    pub(crate) fn upsert(
        &mut self,
        call_id: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> (CallSession, u64) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let entry = self
            .entries
            .entry(call_id.to_string())
            .or_insert_with(|| CallEntry {
                session: CallSession::new(call_id, status, now),
                generation,
                expiry: None,
            });
        entry.session.status = status.to_string();
        entry.generation = generation;
        if let Some(handle) = entry.expiry.take() {
            handle.abort();
        }
        (entry.session.clone(), generation)
    }

    /// Attach a pending expiry task to a call.
    pub(crate) fn set_expiry(&mut self, call_id: &str, handle: AbortHandle) {
        match self.entries.get_mut(call_id) {
            Some(entry) => {
                if let Some(previous) = entry.expiry.replace(handle) {
                    previous.abort();
                }
            }
            None => handle.abort(),
        }
    }

    /// Remove a call only if it has not been updated since `generation`.
    pub(crate) fn remove_if_current(&mut self, call_id: &str, generation: u64) -> Option<CallSession> {
        let current = self.entries.get(call_id)?.generation;
        if current != generation {
            return None;
        }
        self.entries.remove(call_id).map(|entry| entry.session)
    }

    pub(crate) fn contains(&self, call_id: &str) -> bool {
        self.entries.contains_key(call_id)
    }

    pub(crate) fn snapshot(&self) -> ActiveCalls {
        self.entries
            .iter()
            .map(|(call_id, entry)| (call_id.clone(), entry.session.clone()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Cancel every pending expiry task.
    pub(crate) fn abort_expiries(&mut self) -> usize {
        let mut aborted = 0;
        for entry in self.entries.values_mut() {
            if let Some(handle) = entry.expiry.take() {
                handle.abort();
                aborted += 1;
            }
        }
        aborted
    }
}

#[cfg(test)]
mod tests {
    use super::CallTable;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use std::future;

    #[test]
    fn start_time_is_set_once() {
        let first = Utc::now();
        let mut table = CallTable::default();
        let (created, _) = table.upsert("call-1", "ringing", first);
        let (updated, _) = table.upsert("call-1", "active", first + Duration::seconds(5));
        assert_eq!(created.start_time, first);
        assert_eq!(updated.start_time, first);
        assert_eq!(updated.status, "active");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn stale_generation_does_not_remove() {
        let now = Utc::now();
        let mut table = CallTable::default();
        let (_, ended) = table.upsert("call-1", "ended", now);
        let (_, active) = table.upsert("call-1", "active", now);
        assert_eq!(table.remove_if_current("call-1", ended), None);
        assert!(table.contains("call-1"));
        assert_eq!(
            table
                .remove_if_current("call-1", active)
                .map(|session| session.status),
            Some("active".to_string())
        );
        assert!(!table.contains("call-1"));
        assert_eq!(table.remove_if_current("call-1", active), None);
    }

    #[test]
    fn generations_are_unique_across_recreation() {
        let now = Utc::now();
        let mut table = CallTable::default();
        let (_, first) = table.upsert("call-1", "ended", now);
        assert!(table.remove_if_current("call-1", first).is_some());
        let (_, second) = table.upsert("call-1", "active", now);
        assert!(second > first);
        assert_eq!(table.remove_if_current("call-1", first), None);
    }

    #[tokio::test]
    async fn upsert_aborts_pending_expiry() {
        let now = Utc::now();
        let mut table = CallTable::default();
        table.upsert("call-1", "ended", now);
        let task = tokio::spawn(future::pending::<()>());
        table.set_expiry("call-1", task.abort_handle());
        table.upsert("call-1", "active", now);
        let err = task.await.expect_err("aborted");
        assert!(err.is_cancelled());
    }
}
