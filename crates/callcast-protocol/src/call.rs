//! Call session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Status reported while a call is in progress.
pub const STATUS_ACTIVE: &str = "active";
/// Status reported after a call hangs up normally.
pub const STATUS_ENDED: &str = "ended";
/// Status reported after a call fails.
pub const STATUS_FAILED: &str = "failed";

/// Snapshot of every tracked call keyed by call id.
pub type ActiveCalls = BTreeMap<String, CallSession>;

/// Lifecycle record for one call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallSession {
    pub call_id: String,
    /// Free-form upstream status; only terminal statuses are interpreted.
    pub status: String,
    /// First time the hub observed the call.
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub participants: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CallSession {
    /// Create a session first observed at `start_time`.
    pub fn new(
        call_id: impl Into<String>,
        status: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            status: status.into(),
            start_time,
            participants: Map::new(),
            metadata: Map::new(),
        }
    }

    /// Whether the current status schedules the call for removal.
    pub fn is_terminal(&self) -> bool {
        is_terminal_status(&self.status)
    }
}

/// Statuses after which a call is removed from the table.
pub fn is_terminal_status(status: &str) -> bool {
    status == STATUS_ENDED || status == STATUS_FAILED
}

#[cfg(test)]
mod tests {
    use super::{CallSession, is_terminal_status};
    use chrono::Utc;

    #[test]
    fn only_ended_and_failed_are_terminal() {
        assert!(is_terminal_status("ended"));
        assert!(is_terminal_status("failed"));
        assert!(!is_terminal_status("active"));
        assert!(!is_terminal_status("ringing"));
        assert!(!is_terminal_status("Ended"));
        assert!(CallSession::new("c", "failed", Utc::now()).is_terminal());
    }
}
