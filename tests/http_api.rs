use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dwell::kernel::controller::TimerController;
use dwell::kernel::reactor::TimerReactor;
use dwell::kernel::time::Timestamp;
use dwell::server::{app_router, AppState};
use dwell::services::signature;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &[u8] = b"test-client-secret";

fn fixed_clock() -> Timestamp {
    Timestamp::from_millis(60_000)
}

fn test_app(secret: Option<&[u8]>) -> Router {
    let (reactor, handle) = TimerReactor::new(TimerController::in_memory(), 32);
    reactor.spawn();
    let state = AppState::new(handle)
        .with_webhook_secret(secret.map(|s| s.to_vec()))
        .with_clock(fixed_clock);
    app_router(state, "public")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_raw(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// POST to `/api/timers/<command>` at an explicit timestamp.
async fn timer_at(
    app: &Router,
    command: &str,
    op: &str,
    conv: &str,
    ts: u64,
) -> (StatusCode, Value) {
    let body = json!({ "operator_id": op, "conversation_id": conv, "timestamp": ts });
    send(app, post_json(&format!("/api/timers/{}", command), body)).await
}

fn components(canvas: &Value) -> Vec<Value> {
    canvas["canvas"]["content"]["components"].as_array().unwrap().clone()
}

fn signed_webhook(payload: &Value, secret: &[u8]) -> Request<Body> {
    let body = payload.to_string();
    let digest = signature::sign(secret, body.as_bytes()).unwrap();
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("Content-Type", "application/json")
        .header("X-Hub-Signature", format!("sha1={}", digest))
        .body(Body::from(body))
        .unwrap()
}

fn closed_event(topic: &str, conversation_id: &str) -> Value {
    json!({
        "type": "notification_event",
        "topic": topic,
        "data": { "item": { "type": "conversation", "id": conversation_id } }
    })
}

#[tokio::test]
async fn test_health() {
    let app = test_app(None);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_rest_lifecycle_with_explicit_timestamps() {
    let app = test_app(None);
    let (status, started) = timer_at(&app, "start", "A", "C", 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "running");

    let (_, paused) = timer_at(&app, "pause", "A", "C", 10_000).await;
    assert_eq!(paused["elapsed"], 10_000);
    assert_eq!(paused["status"], "paused");

    timer_at(&app, "resume", "A", "C", 15_000).await;
    let (status, stopped) = timer_at(&app, "stop", "A", "C", 25_000).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stopped["elapsed"], 20_000);
    assert_eq!(stopped["elapsed_formatted"], "00:00:20");
    assert_eq!(stopped["session_id"], started["session_id"]);

    let (status, _) = send(&app, get("/api/timers/A/C")).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "Stopped timer leaves the active store");

    let (_, history) = send(&app, get("/api/history/A/C")).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["final_duration"], 20_000);
    assert_eq!(history[0]["duration_formatted"], "00:00:20");

    let (_, stats) = send(&app, get("/api/analytics/A")).await;
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["median_time"], 20_000);
    assert_eq!(stats["median_time_formatted"], "00:00:20");
}

#[tokio::test]
async fn test_pause_without_timer_is_404_and_empty_id_is_400() {
    let app = test_app(None);

    let body = json!({ "operator_id": "A", "conversation_id": "C" });
    let (status, body) = send(&app, post_json("/api/timers/pause", body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("no active timer"));

    let body = json!({ "operator_id": "", "conversation_id": "C" });
    let (status, _) = send(&app, post_json("/api/timers/start", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "conversation_id": "C" });
    let (status, _) = send(&app, post_json("/api/timers/start", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Missing id is a validation failure");
}

#[tokio::test]
async fn test_current_timer_uses_server_clock() {
    let app = test_app(None);
    timer_at(&app, "start", "A", "C", 45_000).await;

    let (status, timer) = send(&app, get("/api/timers/A/C")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timer["elapsed"], 15_000, "Fixed clock at 60s");

    let (_, all) = send(&app, get("/api/timers")).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_limit_query() {
    let app = test_app(None);
    for i in 0..4u64 {
        let base = i * 10_000;
        timer_at(&app, "start", "A", "C", base).await;
        timer_at(&app, "stop", "A", "C", base + 1_000 * (i + 1)).await;
    }

    let (_, recent) = send(&app, get("/api/history/A/C?limit=2")).await;
    let durations: Vec<u64> = recent
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["final_duration"].as_u64().unwrap())
        .collect();
    assert_eq!(durations, vec![3_000, 4_000]);
}

#[tokio::test]
async fn test_huge_timestamps_do_not_take_the_reactor_down() {
    let app = test_app(None);
    let half = u64::MAX / 2 + 1;
    for conv in ["C1", "C2"] {
        timer_at(&app, "start", "A", conv, 0).await;
        let (status, _) = timer_at(&app, "stop", "A", conv, half).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, stats) = send(&app, get("/api/analytics/A")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_sessions"], 2);
    assert_eq!(stats["total_time"].as_u64(), Some(u64::MAX), "Total saturates");

    // Unrelated operators are still served afterwards
    let (status, started) = timer_at(&app, "start", "B", "C3", 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "running");
}

#[tokio::test]
async fn test_signed_webhook_stops_all_timers_on_conversation() {
    let app = test_app(Some(SECRET));
    for op in ["A", "B"] {
        timer_at(&app, "start", op, "C1", 0).await;
    }
    timer_at(&app, "start", "A", "C2", 0).await;

    let event = closed_event("conversation.admin.closed", "C1");
    let (status, ack) = send(&app, signed_webhook(&event, SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["stopped"], 2);

    let (_, all) = send(&app, get("/api/timers")).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["conversation_id"], "C2");

    let (_, history) = send(&app, get("/api/history/B/C1")).await;
    assert_eq!(history[0]["final_duration"], 60_000, "Stopped at the server clock");
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let app = test_app(Some(SECRET));
    timer_at(&app, "start", "A", "C1", 0).await;
    let event = closed_event("conversation.admin.closed", "C1");

    let (status, _) = send(&app, signed_webhook(&event, b"wrong-secret")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, post_json("/webhook", event)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "Unsigned request rejected");

    let (_, all) = send(&app, get("/api/timers")).await;
    assert_eq!(all.as_array().unwrap().len(), 1, "Nothing stopped");
}

#[tokio::test]
async fn test_webhook_other_topics_acknowledged() {
    let app = test_app(None);
    let ping = json!({ "topic": "ping", "data": { "item": {} } });
    let (status, ack) = send(&app, post_json("/webhook", ping)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["topic"], "ping");
    assert_eq!(ack["stopped"], 0);

    let no_id = json!({ "topic": "conversation.admin.closed" });
    let (status, _) = send(&app, post_json("/webhook", no_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Closed event needs a conversation id");

    let (status, body) = send(&app, post_raw("/webhook", "{\"topic\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Malformed JSON body");
    assert!(body["error"].as_str().unwrap().contains("invalid webhook payload"));

    timer_at(&app, "start", "A", "C9", 0).await;
    let event = closed_event("conversation.closed", "C9");
    let (status, ack) = send(&app, post_json("/webhook", event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["stopped"], 1, "Plain conversation.closed also stops timers");
}

#[tokio::test]
async fn test_initialize_starts_timer_and_renders_panel() {
    let app = test_app(None);
    let payload = json!({
        "admin": { "id": 12345 },
        "conversation": { "id": "987" },
        "context": { "location": "conversation" }
    });

    let (status, canvas) = send(&app, post_json("/initialize", payload)).await;
    assert_eq!(status, StatusCode::OK);
    let components = components(&canvas);
    assert!(components.iter().any(|c| c["id"] == "status" && c["text"] == "Status: Running"));
    assert!(components.iter().any(|c| c["type"] == "button" && c["id"] == "pause_timer"));

    let (status, timer) = send(&app, get("/api/timers/12345/987")).await;
    assert_eq!(status, StatusCode::OK, "Numeric admin id normalized to string");
    assert_eq!(timer["status"], "running");
}

#[tokio::test]
async fn test_initialize_outside_conversation_does_not_start() {
    let app = test_app(None);
    let payload = json!({
        "admin": { "id": "A" },
        "conversation": { "id": "C" },
        "context": { "location": "inbox" }
    });

    let (status, _) = send(&app, post_json("/initialize", payload)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/timers/A/C")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let no_admin = json!({ "conversation": { "id": "C" } });
    let (status, _) = send(&app, post_json("/initialize", no_admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Admin id required");
}

#[tokio::test]
async fn test_submit_pause_button() {
    let app = test_app(None);
    timer_at(&app, "start", "A", "C", 0).await;

    let payload = json!({
        "admin": { "id": "A" },
        "conversation": { "id": "C" },
        "component_id": "pause_timer"
    });
    let (status, canvas) = send(&app, post_json("/submit", payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let components = components(&canvas);
    assert!(components.iter().any(|c| c["id"] == "resume_timer"));
    assert!(components.iter().any(|c| c["id"] == "elapsed" && c["text"] == "00:01:00"));

    // Pressing pause again is swallowed, not an error
    let (status, _) = send(&app, post_json("/submit", payload)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_panel_lists_recent_sessions_newest_first() {
    let app = test_app(None);
    for i in 1..=7u64 {
        let base = i * 100_000;
        timer_at(&app, "start", "A", "C", base).await;
        timer_at(&app, "stop", "A", "C", base + i * 1_000).await;
    }

    let payload = json!({
        "admin": { "id": "A" },
        "conversation": { "id": "C" },
        "component_id": "refresh"
    });
    let (status, canvas) = send(&app, post_json("/submit", payload)).await;
    assert_eq!(status, StatusCode::OK);
    let components = components(&canvas);

    assert!(components.iter().any(|c| c["id"] == "status" && c["text"] == "No active timer"));
    assert!(components.iter().any(|c| c["type"] == "divider"));
    assert!(components.iter().any(|c| c["id"] == "history_title"));

    let sessions: Vec<&str> = components
        .iter()
        .filter(|c| c["id"].as_str().map_or(false, |id| id.starts_with("session_")))
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        sessions,
        vec!["00:00:07", "00:00:06", "00:00:05", "00:00:04", "00:00:03"],
        "Last five sessions, newest first"
    );
    assert!(!components.iter().any(|c| c["id"] == "session_5"));
}

#[tokio::test]
async fn test_simulate_full_flow() {
    let app = test_app(None);
    let step = |action: &str, ts: u64| {
        let body = json!({
            "operator_id": "A",
            "conversation_id": "C",
            "action": action,
            "timestamp": ts
        });
        post_json("/api/simulate", body)
    };

    send(&app, step("open", 0)).await;
    send(&app, step("navigate_away", 10_000)).await;
    send(&app, step("return", 15_000)).await;
    let (status, closed) = send(&app, step("close", 25_000)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["timers"][0]["elapsed"], 20_000);
    assert_eq!(closed["timers"][0]["status"], "stopped");

    let (status, empty) = send(&app, step("navigate_away", 30_000)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(empty["timers"].as_array().unwrap().is_empty());
}
