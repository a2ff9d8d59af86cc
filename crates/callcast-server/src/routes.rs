use crate::error::ServerError;
use crate::stream;
use callcast_config::ServerConfig;
use callcast_core::{CallHub, SUPPORTED_EVENTS, WebhookEvent, WebhookOutcome, dispatch};
use callcast_protocol::{BROADCAST_MESSAGE_TYPES, HubStats};
use log::debug;
use rocket::data::{Data, ToByteUnit};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State, get, options, post, routes};
use serde_json::{Value, json};

const TEST_CALL_ID: &str = "test-call-123";

pub(crate) fn routes() -> Vec<Route> {
    routes![
        index,
        vapi_webhook,
        test_webhook,
        calls,
        transcripts,
        clear_transcripts,
        stats,
        ws_info,
        health,
        transcript_stream,
        preflight,
    ]
}

#[get("/")]
fn index(hub: &State<CallHub>, server: &State<ServerConfig>) -> Json<Value> {
    let stats = hub.stats();
    Json(json!({
        "message": "callcast live transcription server",
        "status": "running",
        "webhook_url": format!("{}/vapi/webhook", server.http_base_url()),
        "websocket_url": format!("{}/ws/transcript", server.ws_base_url()),
        "active_calls": stats.active_calls,
        "total_transcripts": stats.total_transcripts,
        "websocket_connections": stats.active_connections,
        "supported_events": SUPPORTED_EVENTS,
    }))
}

#[post("/vapi/webhook", data = "<body>")]
async fn vapi_webhook(
    body: Data<'_>,
    hub: &State<CallHub>,
) -> Result<Json<WebhookOutcome>, ServerError> {
    let raw = body.open(2.mebibytes()).into_string().await?;
    if !raw.is_complete() {
        return Err(ServerError::PayloadTooLarge);
    }
    let raw = raw.into_inner();
    let payload: Value = serde_json::from_str(&raw).map_err(|err| {
        debug!("rejecting webhook body (len={}, err={})", raw.len(), err);
        ServerError::InvalidJson
    })?;
    let event = WebhookEvent::from_payload(&payload);
    debug!("webhook received (type={})", event.event_type());
    Ok(Json(dispatch(hub, event)))
}

#[post("/test-webhook")]
fn test_webhook(hub: &State<CallHub>) -> Json<Value> {
    let payload = json!({
        "message": {
            "type": "transcript",
            "role": "user",
            "transcript": "Hello, this is a test message from the API",
            "call": { "id": TEST_CALL_ID },
        }
    });
    let outcome = dispatch(hub, WebhookEvent::from_payload(&payload));
    Json(json!({
        "status": "test message sent",
        "result": outcome,
        "websocket_clients_notified": hub.connection_count(),
    }))
}

#[get("/calls")]
fn calls(hub: &State<CallHub>) -> Json<Value> {
    let active_calls = hub.active_calls();
    let count = active_calls.len();
    Json(json!({ "active_calls": active_calls, "count": count }))
}

#[get("/transcripts")]
fn transcripts(hub: &State<CallHub>) -> Json<Value> {
    let recent = hub.recent_transcripts(hub.config().snapshot_size);
    Json(json!({
        "transcripts": recent,
        "total_count": hub.stats().total_transcripts,
    }))
}

#[post("/transcripts/clear")]
fn clear_transcripts(hub: &State<CallHub>) -> Json<Value> {
    let cleared = hub.clear_transcripts();
    Json(json!({ "status": "cleared", "cleared": cleared }))
}

#[get("/stats")]
fn stats(hub: &State<CallHub>) -> Json<HubStats> {
    Json(hub.stats())
}

#[get("/ws/info")]
fn ws_info(hub: &State<CallHub>, server: &State<ServerConfig>) -> Json<Value> {
    Json(json!({
        "websocket_url": format!("{}/ws/transcript", server.ws_base_url()),
        "active_connections": hub.connection_count(),
        "supported_message_types": BROADCAST_MESSAGE_TYPES,
    }))
}

#[get("/health")]
fn health(hub: &State<CallHub>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": hub.now(),
        "server": "callcast",
    }))
}

#[get("/ws/transcript")]
fn transcript_stream(ws: rocket_ws::WebSocket, hub: &State<CallHub>) -> rocket_ws::Channel<'static> {
    use futures_util::StreamExt;

    let hub = hub.inner().clone();
    let buffer = hub.config().subscriber_buffer;
    ws.channel(move |duplex| {
        Box::pin(async move {
            let (sink, incoming) = duplex.split();
            stream::run(hub, buffer, sink, incoming).await;
            Ok(())
        })
    })
}

#[options("/<_..>")]
fn preflight() -> Status {
    Status::NoContent
}
