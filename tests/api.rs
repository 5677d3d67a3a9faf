use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use pomodoro_daemon::{
    create_router,
    services::{platform::Platform, HeadlessPlatform},
    state::{AppState, RuntimeOptions, Settings},
    tasks::window_watch_task,
};

fn app() -> (Router, Arc<AppState>, Arc<HeadlessPlatform>) {
    let platform = Arc::new(HeadlessPlatform::default());
    let dyn_platform: Arc<dyn Platform> = platform.clone();
    let state = AppState::new(Settings::from_minutes(25, 5), dyn_platform, RuntimeOptions::default());
    (create_router(Arc::clone(&state)), state, platform)
}

async fn call(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test(start_paused = true)]
async fn get_state_returns_idle_focus_snapshot() {
    let (app, _state, _platform) = app();
    let (status, body) = call(&app, "POST", "/command", r#"{"type":"GET_STATE"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "remainingSeconds": 1500,
            "phase": "focus",
            "running": false,
            "settings": {"focusMinutes": 25, "breakMinutes": 5}
        })
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_and_unknown_messages_still_answer() {
    let (app, _state, _platform) = app();

    let (status, body) = call(&app, "POST", "/command", "not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remainingSeconds"], 1500);

    let (status, body) = call(&app, "POST", "/command", r#"{"type":"SELF_DESTRUCT"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["running"], false);
}

#[tokio::test(start_paused = true)]
async fn start_with_forced_break_over_message_protocol() {
    let (app, state, _platform) = app();
    let (_, body) = call(
        &app,
        "POST",
        "/command",
        r#"{"type":"START_TIMER","payload":{"forceFocus":false}}"#,
    )
    .await;

    assert_eq!(body["phase"], "break");
    assert_eq!(body["remainingSeconds"], 300);
    assert_eq!(body["running"], true);
    assert_eq!(state.active_clocks(), 1);

    let (_, body) = call(&app, "POST", "/command", r#"{"type":"PAUSE_TIMER"}"#).await;
    assert_eq!(body["running"], false);
    assert_eq!(state.active_clocks(), 0);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_settings_are_rejected_whole() {
    let (app, _state, _platform) = app();
    let (_, body) = call(
        &app,
        "POST",
        "/command",
        r#"{"type":"UPDATE_SETTINGS","payload":{"focusMinutes":60,"breakMinutes":7}}"#,
    )
    .await;
    assert_eq!(body["settings"], json!({"focusMinutes": 25, "breakMinutes": 5}));

    let (_, body) = call(&app, "POST", "/settings", r#"{"focusTime":"40"}"#).await;
    assert_eq!(body["settings"]["focusMinutes"], 40);
    assert_eq!(body["remainingSeconds"], 2400);
}

#[tokio::test(start_paused = true)]
async fn convenience_routes_share_dispatch() {
    let (app, state, _platform) = app();

    let (_, body) = call(&app, "POST", "/toggle", "").await;
    assert_eq!(body["running"], true);
    let (_, body) = call(&app, "POST", "/reset", "").await;
    assert_eq!(body["running"], false);
    assert_eq!(body["remainingSeconds"], 1500);

    let (status, body) = call(&app, "GET", "/status", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lastAction"]["action"], "RESET_TIMER");
    assert_eq!(body["activeClocks"], 0);
    assert_eq!(state.active_clocks(), 0);
}

#[tokio::test(start_paused = true)]
async fn windows_and_buttons_over_http() {
    let (app, state, platform) = app();
    tokio::spawn(window_watch_task(Arc::clone(&state)));
    tokio::task::yield_now().await;

    let (_, body) = call(&app, "POST", "/status-window", "").await;
    assert_eq!(body, json!({"open": true}));
    let id = state.tracked_windows().status.unwrap();

    let (status, _) = call(&app, "POST", &format!("/windows/{}/close", id), "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(platform.open_windows(), 0);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(state.tracked_windows().status, None);
    let (status, _) = call(&app, "POST", &format!("/windows/{}/close", id), "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, "POST", "/notifications/missing/buttons/0", "").await;
    assert_eq!(body, json!({"accepted": false}));
}

#[tokio::test]
async fn health_reports_version() {
    let (app, _state, _platform) = app();
    let (status, body) = call(&app, "GET", "/health", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
