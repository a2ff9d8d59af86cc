//! Bounded transcript log.

use callcast_protocol::{TranscriptEntry, TranscriptRecord};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Ordered transcript history that evicts its oldest entries past capacity.
#[derive(Debug)]
pub(crate) struct TranscriptLog {
    entries: VecDeque<TranscriptEntry>,
    capacity: usize,
    /// Next id sequence; never reset, so ids stay unique after eviction or clear.
    next_sequence: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl TranscriptLog {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_sequence: 0,
            last_timestamp: None,
        }
    }

    /// Store a record, stamping it no earlier than the previous entry.
    pub(crate) fn append(&mut self, record: TranscriptRecord, now: DateTime<Utc>) -> TranscriptEntry {
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        let call_id = record.call_id_or_default().to_string();
        let entry = TranscriptEntry {
            id: format!("{call_id}_{}", self.next_sequence),
            role: record.role_or_default().to_string(),
            text: record.text_or_default().to_string(),
            timestamp,
            call_id,
            confidence: record.confidence_or_default(),
        };
        self.next_sequence += 1;

        self.entries.push_back(entry.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        entry
    }

    /// The last `count` entries in append order.
    pub(crate) fn recent(&self, count: usize) -> Vec<TranscriptEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Entries stamped within `window` of `now`.
    pub(crate) fn count_since(&self, now: DateTime<Utc>, window: chrono::Duration) -> usize {
        self.entries
            .iter()
            .filter(|entry| now.signed_duration_since(entry.timestamp) < window)
            .count()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop every entry, returning how many were removed.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::TranscriptLog;
    use callcast_protocol::TranscriptRecord;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn record(text: &str) -> TranscriptRecord {
        TranscriptRecord::new("user", text, "call-1")
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let now = Utc::now();
        let mut log = TranscriptLog::new(3);
        for idx in 0..5 {
            log.append(record(&format!("line {idx}")), now);
        }
        assert_eq!(log.len(), 3);
        let texts: Vec<String> = log.recent(10).into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let now = Utc::now();
        let mut log = TranscriptLog::new(10);
        for idx in 0..4 {
            log.append(record(&idx.to_string()), now);
        }
        let texts: Vec<String> = log.recent(2).into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["2", "3"]);
        assert!(log.recent(0).is_empty());
        assert_eq!(log.recent(100).len(), 4);
    }

    #[test]
    fn ids_stay_unique_across_eviction_and_clear() {
        let now = Utc::now();
        let mut log = TranscriptLog::new(2);
        let mut ids = HashSet::new();
        for _ in 0..5 {
            assert!(ids.insert(log.append(record("x"), now).id));
        }
        log.clear();
        assert!(ids.insert(log.append(record("x"), now).id));
        assert!(ids.contains("call-1_0"));
        assert!(ids.contains("call-1_5"));
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 10).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut log = TranscriptLog::new(10);
        let first = log.append(record("a"), later);
        let second = log.append(record("b"), earlier);
        assert_eq!(first.timestamp, later);
        assert_eq!(second.timestamp, later);
    }

    #[test]
    fn missing_fields_use_sentinels() {
        let mut log = TranscriptLog::new(10);
        let entry = log.append(TranscriptRecord::default(), Utc::now());
        assert_eq!(entry.id, "unknown_0");
        assert_eq!(entry.role, "unknown");
        assert_eq!(entry.text, "");
        assert_eq!(entry.call_id, "unknown");
        assert_eq!(entry.confidence, 1.0);
    }

    #[test]
    fn count_since_respects_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut log = TranscriptLog::new(10);
        log.append(record("old"), start);
        log.append(record("new"), start + Duration::seconds(200));
        let now = start + Duration::seconds(350);
        assert_eq!(log.count_since(now, Duration::seconds(300)), 1);
        assert_eq!(log.count_since(now, Duration::seconds(400)), 2);
    }
}
