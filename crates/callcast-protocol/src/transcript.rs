//! Transcript entries and the normalized records they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when an inbound event omits a role or call id.
pub const UNKNOWN: &str = "unknown";
/// Confidence assigned when the upstream event carries none.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// A single stored line of a call transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    /// Identifier of the form `{call_id}_{sequence}`.
    pub id: String,
    /// Speaker role, usually "user" or "assistant".
    pub role: String,
    /// Transcribed text.
    #[serde(rename = "transcript")]
    pub text: String,
    /// Time the hub stored the entry.
    pub timestamp: DateTime<Utc>,
    /// Call the line belongs to.
    pub call_id: String,
    /// Recognizer confidence.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// Transcript fields extracted from an inbound event, before the hub assigns
/// an id and timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TranscriptRecord {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl TranscriptRecord {
    /// Build a record with every field present.
    pub fn new(
        role: impl Into<String>,
        text: impl Into<String>,
        call_id: impl Into<String>,
    ) -> Self {
        Self {
            role: Some(role.into()),
            text: Some(text.into()),
            call_id: Some(call_id.into()),
            confidence: None,
        }
    }

    /// Attach a recognizer confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Role, or `"unknown"` when absent.
    pub fn role_or_default(&self) -> &str {
        self.role.as_deref().unwrap_or(UNKNOWN)
    }

    /// Call id, or `"unknown"` when absent.
    pub fn call_id_or_default(&self) -> &str {
        self.call_id.as_deref().unwrap_or(UNKNOWN)
    }

    /// Text, or the empty string when absent.
    pub fn text_or_default(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Confidence, or 1.0 when absent.
    pub fn confidence_or_default(&self) -> f64 {
        self.confidence.unwrap_or(DEFAULT_CONFIDENCE)
    }
}
