//! Wire protocol types for callcast subscribers, plus the shared data model.

mod call;
mod transcript;

pub use call::{
    ActiveCalls, CallSession, STATUS_ACTIVE, STATUS_ENDED, STATUS_FAILED, is_terminal_status,
};
pub use transcript::{DEFAULT_CONFIDENCE, TranscriptEntry, TranscriptRecord, UNKNOWN};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a registered subscriber.
pub type SubscriberId = Uuid;

/// Messages pushed from the hub to subscribers.
///
/// Events go out as `{"type": .., "data": ..}`. The `initial_data` snapshot
/// carries `transcripts` and `active_calls` next to `type` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Catch-up snapshot sent once, right after registration.
    InitialData(InitialData),
    /// A newly stored transcript line.
    Transcript(TranscriptEntry),
    /// A call was created or changed status.
    CallStatus {
        call_id: String,
        session: CallSession,
    },
    /// The voice agent invoked a function.
    FunctionCall {
        function_name: String,
        parameters: Value,
        timestamp: DateTime<Utc>,
    },
    /// The upstream conversation history changed.
    ConversationUpdate {
        call_id: String,
        message_count: usize,
        timestamp: DateTime<Utc>,
    },
    /// An ended call expired from the table.
    CallRemoved { call_id: String },
    /// The transcript log was emptied.
    TranscriptsCleared {
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Reply to a client `ping`.
    Pong,
}

impl ServerMessage {
    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::InitialData(_) => "initial_data",
            ServerMessage::Transcript(_) => "transcript",
            ServerMessage::CallStatus { .. } => "call_status",
            ServerMessage::FunctionCall { .. } => "function_call",
            ServerMessage::ConversationUpdate { .. } => "conversation_update",
            ServerMessage::CallRemoved { .. } => "call_removed",
            ServerMessage::TranscriptsCleared { .. } => "transcripts_cleared",
            ServerMessage::Pong => "pong",
        }
    }
}

impl Serialize for ServerMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let frame = match self {
            ServerMessage::InitialData(data) => {
                return Snapshot { data }.serialize(serializer);
            }
            ServerMessage::Transcript(entry) => Frame::Transcript(entry),
            ServerMessage::CallStatus { call_id, session } => Frame::CallStatus { call_id, session },
            ServerMessage::FunctionCall {
                function_name,
                parameters,
                timestamp,
            } => Frame::FunctionCall {
                function_name,
                parameters,
                timestamp,
            },
            ServerMessage::ConversationUpdate {
                call_id,
                message_count,
                timestamp,
            } => Frame::ConversationUpdate {
                call_id,
                message_count: *message_count,
                timestamp,
            },
            ServerMessage::CallRemoved { call_id } => Frame::CallRemoved { call_id },
            ServerMessage::TranscriptsCleared { message, timestamp } => {
                Frame::TranscriptsCleared { message, timestamp }
            }
            ServerMessage::Pong => Frame::Pong,
        };
        frame.serialize(serializer)
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename = "initial_data")]
struct Snapshot<'a> {
    #[serde(flatten)]
    data: &'a InitialData,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "data")]
enum Frame<'a> {
    Transcript(&'a TranscriptEntry),
    CallStatus {
        call_id: &'a str,
        session: &'a CallSession,
    },
    FunctionCall {
        function_name: &'a str,
        parameters: &'a Value,
        timestamp: &'a DateTime<Utc>,
    },
    ConversationUpdate {
        call_id: &'a str,
        message_count: usize,
        timestamp: &'a DateTime<Utc>,
    },
    CallRemoved {
        call_id: &'a str,
    },
    TranscriptsCleared {
        message: &'a str,
        timestamp: &'a DateTime<Utc>,
    },
    Pong,
}

/// Message kinds a subscriber can see as a result of hub activity.
pub const BROADCAST_MESSAGE_TYPES: &[&str] = &[
    "transcript",
    "call_status",
    "function_call",
    "conversation_update",
    "call_removed",
    "transcripts_cleared",
];

/// Payload of the `initial_data` message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InitialData {
    pub transcripts: Vec<TranscriptEntry>,
    pub active_calls: ActiveCalls,
}

/// Messages a subscriber may send back over its connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ClientMessage {
    /// Keepalive probe answered with `pong`.
    Ping,
}

impl ClientMessage {
    /// Parse a client frame; unknown or malformed frames yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Counters reported by the hub.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HubStats {
    /// Registered subscribers.
    pub active_connections: usize,
    /// Entries currently held in the transcript log.
    pub total_transcripts: usize,
    /// Calls currently tracked.
    pub active_calls: usize,
    /// Transcripts stored within the recent-activity window.
    pub recent_activity: usize,
}
