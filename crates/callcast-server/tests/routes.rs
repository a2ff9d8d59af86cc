//! HTTP routes exercised through rocket's local client.

use callcast_config::CallcastConfig;
use callcast_core::CallHub;
use callcast_server::build;
use callcast_test_utils::{RecordingSubscriber, call_event, status_update, transcript_event};
use pretty_assertions::assert_eq;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::Value;

async fn client() -> (Client, CallHub) {
    let config = CallcastConfig::default();
    let hub = CallHub::new(config.hub.clone());
    let rocket = build(hub.clone(), &config).expect("listen address");
    let client = Client::tracked(rocket)
        .await
        .expect("valid rocket");
    (client, hub)
}

async fn post_webhook(client: &Client, body: &Value) -> (Status, Value) {
    let response = client
        .post("/vapi/webhook")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    (status, response.into_json().await.expect("json body"))
}

/// Transcript webhooks are stored and broadcast.
#[tokio::test]
async fn webhook_transcript_is_stored() {
    let (client, hub) = client().await;
    let subscriber = RecordingSubscriber::new();
    hub.register(subscriber.clone());

    let (status, body) =
        post_webhook(&client, &transcript_event("call-1", "user", "hello there")).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message_type"], "transcript");
    assert_eq!(body["processed"], true);
    assert_eq!(body["result"]["transcript_id"], "call-1_0");
    assert_eq!(subscriber.kinds(), vec!["initial_data", "transcript"]);

    let response = client.get("/transcripts").dispatch().await;
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["transcripts"][0]["transcript"], "hello there");
}

/// Malformed bodies are rejected before reaching the hub.
#[tokio::test]
async fn webhook_rejects_invalid_json() {
    let (client, hub) = client().await;
    let response = client
        .post("/vapi/webhook")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body, serde_json::json!({ "detail": "Invalid JSON" }));
    assert_eq!(hub.stats().total_transcripts, 0);
}

/// Unknown event types are acknowledged with a warning.
#[tokio::test]
async fn webhook_reports_unsupported_events() {
    let (client, _hub) = client().await;
    let (status, body) = post_webhook(
        &client,
        &serde_json::json!({ "message": { "type": "speech-update" } }),
    )
    .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "warning");
    assert_eq!(body["reason"], "unsupported_event_type");
    assert_eq!(body["processed"], false);
}

/// Call lifecycle events show up in `/calls`.
#[tokio::test]
async fn call_events_update_calls_view() {
    let (client, _hub) = client().await;
    post_webhook(&client, &call_event("call-start", "call-7")).await;
    let response = client.get("/calls").dispatch().await;
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["count"], 1);
    assert_eq!(body["active_calls"]["call-7"]["status"], "active");

    let (_, body) = post_webhook(&client, &status_update("call-7", "ended")).await;
    assert_eq!(body["result"]["status"], "ended");
    let response = client.get("/calls").dispatch().await;
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["active_calls"]["call-7"]["status"], "ended");
}

/// The canned test webhook feeds one transcript through the pipeline.
#[tokio::test]
async fn test_webhook_sends_canned_transcript() {
    let (client, hub) = client().await;
    let response = client.post("/test-webhook").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["status"], "test message sent");
    assert_eq!(body["result"]["result"]["call_id"], "test-call-123");
    assert_eq!(hub.recent_transcripts(1)[0].call_id, "test-call-123");
}

/// Clearing empties the log and reports the count.
#[tokio::test]
async fn clear_route_empties_log() {
    let (client, hub) = client().await;
    post_webhook(&client, &transcript_event("call-1", "user", "a")).await;
    post_webhook(&client, &transcript_event("call-1", "assistant", "b")).await;

    let response = client.post("/transcripts/clear").dispatch().await;
    let body: Value = response.into_json().await.expect("json body");
    assert_eq!(body["cleared"], 2);
    assert_eq!(hub.stats().total_transcripts, 0);
}

/// Stats, info and health views expose the hub counters.
#[tokio::test]
async fn read_only_views() {
    let (client, hub) = client().await;
    hub.register(RecordingSubscriber::new());
    post_webhook(&client, &transcript_event("call-1", "user", "x")).await;

    let stats: Value = client
        .get("/stats")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("stats");
    assert_eq!(stats["active_connections"], 1);
    assert_eq!(stats["total_transcripts"], 1);
    assert_eq!(stats["recent_activity"], 1);

    let info: Value = client
        .get("/ws/info")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("ws info");
    assert_eq!(info["websocket_url"], "ws://localhost:8000/ws/transcript");
    assert_eq!(info["active_connections"], 1);

    let index: Value = client
        .get("/")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("index");
    assert_eq!(index["webhook_url"], "http://localhost:8000/vapi/webhook");
    assert_eq!(index["supported_events"].as_array().map(Vec::len), Some(6));

    let health: Value = client
        .get("/health")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("health");
    assert_eq!(health["status"], "healthy");
}

/// Responses carry CORS headers when enabled.
#[tokio::test]
async fn responses_carry_cors_headers() {
    let (client, _hub) = client().await;
    let response = client.get("/health").dispatch().await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );
    let preflight = client.options("/vapi/webhook").dispatch().await;
    assert_eq!(preflight.status(), Status::NoContent);
}
