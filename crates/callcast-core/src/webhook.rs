//! Voice-agent webhook normalization.
//!
//! Inbound payloads are classified by their `type` field (optionally nested
//! under a top-level `message` object) and turned into hub operations.

use crate::hub::CallHub;
use callcast_protocol::{STATUS_ACTIVE, STATUS_ENDED, TranscriptRecord, UNKNOWN};
use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Event types the normalizer acts on.
pub const SUPPORTED_EVENTS: &[&str] = &[
    "transcript",
    "status-update",
    "function-call",
    "call-start",
    "call-end",
    "conversation-update",
];

/// A classified webhook event with its extracted fields.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Transcript(TranscriptRecord),
    StatusUpdate {
        call_id: String,
        status: String,
        ended_reason: String,
    },
    FunctionCall {
        name: String,
        parameters: Value,
    },
    CallStart {
        call_id: String,
    },
    CallEnd {
        call_id: String,
        ended_reason: String,
    },
    ConversationUpdate {
        call_id: String,
        message_count: usize,
    },
    /// Any other `type`, kept for reporting.
    Unsupported {
        event_type: String,
    },
}

impl WebhookEvent {
    /// Classify a raw webhook body.
    pub fn from_payload(payload: &Value) -> Self {
        let message = match payload.get("message") {
            Some(inner @ Value::Object(_)) => inner,
            _ => payload,
        };
        let Some(message) = message.as_object() else {
            return WebhookEvent::Unsupported {
                event_type: UNKNOWN.to_string(),
            };
        };
        let event_type = str_field(message, "type").unwrap_or(UNKNOWN);

        match event_type {
            "transcript" => WebhookEvent::Transcript(TranscriptRecord {
                role: str_field(message, "role").map(str::to_string),
                text: str_field(message, "transcript").map(str::to_string),
                call_id: nested_call_id(message).map(str::to_string),
                confidence: message.get("confidence").and_then(Value::as_f64),
            }),
            "status-update" => WebhookEvent::StatusUpdate {
                call_id: str_field(message, "callId")
                    .or_else(|| str_field(message, "id"))
                    .or_else(|| nested_call_id(message))
                    .unwrap_or(UNKNOWN)
                    .to_string(),
                status: str_field(message, "status").unwrap_or(UNKNOWN).to_string(),
                ended_reason: str_field(message, "endedReason")
                    .unwrap_or_default()
                    .to_string(),
            },
            "function-call" => {
                let function_call = message.get("functionCall");
                WebhookEvent::FunctionCall {
                    name: function_call
                        .and_then(|call| call.get("name"))
                        .and_then(Value::as_str)
                        .unwrap_or(UNKNOWN)
                        .to_string(),
                    parameters: function_call
                        .and_then(|call| call.get("parameters"))
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new())),
                }
            }
            "call-start" => WebhookEvent::CallStart {
                call_id: nested_call_id(message).unwrap_or(UNKNOWN).to_string(),
            },
            "call-end" => WebhookEvent::CallEnd {
                call_id: nested_call_id(message).unwrap_or(UNKNOWN).to_string(),
                ended_reason: str_field(message, "endedReason")
                    .unwrap_or(UNKNOWN)
                    .to_string(),
            },
            "conversation-update" => WebhookEvent::ConversationUpdate {
                call_id: nested_call_id(message).unwrap_or(UNKNOWN).to_string(),
                message_count: message
                    .get("conversation")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
            },
            other => WebhookEvent::Unsupported {
                event_type: other.to_string(),
            },
        }
    }

    /// Wire name of the event type.
    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::Transcript(_) => "transcript",
            WebhookEvent::StatusUpdate { .. } => "status-update",
            WebhookEvent::FunctionCall { .. } => "function-call",
            WebhookEvent::CallStart { .. } => "call-start",
            WebhookEvent::CallEnd { .. } => "call-end",
            WebhookEvent::ConversationUpdate { .. } => "conversation-update",
            WebhookEvent::Unsupported { event_type } => event_type.as_str(),
        }
    }
}

/// Whether the event was acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Success,
    Warning,
}

/// Response body for a processed webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookOutcome {
    pub status: WebhookStatus,
    pub message_type: String,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WebhookOutcome {
    fn success(message_type: &str, result: Value) -> Self {
        Self {
            status: WebhookStatus::Success,
            message_type: message_type.to_string(),
            processed: true,
            result: Some(result),
            reason: None,
        }
    }

    fn unsupported(message_type: &str) -> Self {
        Self {
            status: WebhookStatus::Warning,
            message_type: message_type.to_string(),
            processed: false,
            result: None,
            reason: Some("unsupported_event_type".to_string()),
        }
    }
}

/// Apply an event to the hub and describe what happened.
pub fn dispatch(hub: &CallHub, event: WebhookEvent) -> WebhookOutcome {
    let message_type = event.event_type().to_string();
    match event {
        WebhookEvent::Transcript(record) => {
            let entry = hub.append_transcript(record);
            info!(
                "webhook transcript (call_id={}, role={}, length={})",
                entry.call_id,
                entry.role,
                entry.text.chars().count()
            );
            WebhookOutcome::success(
                &message_type,
                json!({
                    "transcript_id": entry.id,
                    "role": entry.role,
                    "call_id": entry.call_id,
                    "length": entry.text.chars().count(),
                }),
            )
        }
        WebhookEvent::StatusUpdate {
            call_id,
            status,
            ended_reason,
        } => {
            hub.update_call_status(&call_id, &status);
            info!(
                "webhook status update (call_id={}, status={}, ended_reason={})",
                call_id, status, ended_reason
            );
            WebhookOutcome::success(
                &message_type,
                json!({
                    "call_id": call_id,
                    "status": status,
                    "end_reason": ended_reason,
                    "updated_at": hub.now(),
                }),
            )
        }
        WebhookEvent::FunctionCall { name, parameters } => {
            let parameter_count = match &parameters {
                Value::Object(map) => map.len(),
                Value::Array(items) => items.len(),
                _ => 0,
            };
            hub.publish_function_call(&name, parameters);
            WebhookOutcome::success(
                &message_type,
                json!({
                    "function_name": name,
                    "parameter_count": parameter_count,
                }),
            )
        }
        WebhookEvent::CallStart { call_id } => {
            hub.update_call_status(&call_id, STATUS_ACTIVE);
            info!("webhook call start (call_id={})", call_id);
            WebhookOutcome::success(
                &message_type,
                json!({ "call_id": call_id, "started_at": hub.now() }),
            )
        }
        WebhookEvent::CallEnd {
            call_id,
            ended_reason,
        } => {
            hub.update_call_status(&call_id, STATUS_ENDED);
            info!(
                "webhook call end (call_id={}, ended_reason={})",
                call_id, ended_reason
            );
            WebhookOutcome::success(
                &message_type,
                json!({
                    "call_id": call_id,
                    "end_reason": ended_reason,
                    "ended_at": hub.now(),
                }),
            )
        }
        WebhookEvent::ConversationUpdate {
            call_id,
            message_count,
        } => {
            hub.publish_conversation_update(&call_id, message_count);
            WebhookOutcome::success(
                &message_type,
                json!({ "call_id": call_id, "message_count": message_count }),
            )
        }
        WebhookEvent::Unsupported { event_type } => {
            warn!("unsupported webhook event (type={})", event_type);
            WebhookOutcome::unsupported(&message_type)
        }
    }
}

fn str_field<'a>(message: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    message.get(key).and_then(Value::as_str)
}

fn nested_call_id(message: &Map<String, Value>) -> Option<&str> {
    message
        .get("call")
        .and_then(|call| call.get("id"))
        .and_then(Value::as_str)
}
