use callcast_protocol::TranscriptRecord;
use serde_json::{Value, json};

pub fn transcript_record(call_id: &str, text: &str) -> TranscriptRecord {
    TranscriptRecord::new("user", text, call_id)
}

/// Webhook body for a transcript event, wrapped in `message`.
pub fn transcript_event(call_id: &str, role: &str, text: &str) -> Value {
    json!({
        "message": {
            "type": "transcript",
            "role": role,
            "transcript": text,
            "call": { "id": call_id },
        }
    })
}

pub fn status_update(call_id: &str, status: &str) -> Value {
    json!({
        "message": {
            "type": "status-update",
            "status": status,
            "callId": call_id,
        }
    })
}

/// Webhook body for `call-start` or `call-end`.
pub fn call_event(event_type: &str, call_id: &str) -> Value {
    json!({
        "message": {
            "type": event_type,
            "call": { "id": call_id },
            "endedReason": "customer-ended-call",
        }
    })
}
