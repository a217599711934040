//! End-to-end tests for the full alerthubd stack.
//!
//! Each test starts a complete engine over the in-memory adapters (real
//! registry, real watchers, real watchdog, real axum router) and exercises
//! it through the stores and the HTTP layer via `tower::ServiceExt::oneshot`.
//! No TCP port is bound. Time is paused, so sleeping lets every spawned task
//! run to quiescence before the clock moves.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use alerthub_adapter_virtual::{
    InMemoryRealtimeStore, InMemoryRuleStore, InMemoryUserDirectory, LoggingPushSender,
};
use alerthub_domain::id::RuleId;
use alerthub_domain::user::UserRecord;
use alerthubd::config::Config;
use alerthubd::engine::Engine;

type TestEngine =
    Engine<InMemoryRuleStore, InMemoryRealtimeStore, InMemoryUserDirectory, Arc<LoggingPushSender>>;

struct Stack {
    rules: Arc<InMemoryRuleStore>,
    realtime: Arc<InMemoryRealtimeStore>,
    outbox: Arc<LoggingPushSender>,
    engine: TestEngine,
}

fn stack(config: &Config) -> Stack {
    let rules = Arc::new(InMemoryRuleStore::default());
    let realtime = Arc::new(InMemoryRealtimeStore::default());
    let outbox = Arc::new(LoggingPushSender::default());
    let users = InMemoryUserDirectory::with_users(vec![
        UserRecord::new("u1")
            .with_email("one@example.com")
            .with_token("device-a"),
    ]);
    let engine = Engine::start(
        config,
        Arc::clone(&rules),
        Arc::clone(&realtime),
        users,
        Arc::clone(&outbox),
    );
    Stack {
        rules,
        realtime,
        outbox,
        engine,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn too_hot_rule() -> Value {
    json!({
        "action": {
            "type": "notification",
            "payload": { "title": "Too hot", "text": "Temperature above 30" }
        },
        "condition": {
            "source": "rtdb",
            "path": "/sensors/temperature",
            "operator": ">",
            "value": 30
        },
        "target_uid": "u1"
    })
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_return_ok_when_health_check_called() {
    let stack = stack(&Config::default());

    let resp = stack
        .engine
        .router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    stack.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn should_list_rule_as_watched_once_feed_delivers_it() {
    let stack = stack(&Config::default());
    stack.rules.put("too-hot", too_hot_rule());
    settle().await;

    let (status, body) = get_json(stack.engine.router(), "/api/rules").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["rules"][0]["id"], "too-hot");
    assert_eq!(body["rules"][0]["watching"], true);
    assert_eq!(body["rules"][0]["mode"], "event");
    stack.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn should_read_realtime_value_over_http() {
    let stack = stack(&Config::default());
    stack.realtime.set("/sensors/temperature", json!(22));

    let (status, body) = get_json(
        stack.engine.router(),
        "/api/realtime?path=/sensors/temperature",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], 22);
    stack.engine.shutdown().await;
}

// ---------------------------------------------------------------------------
// Rule lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_notify_target_when_condition_holds() {
    let stack = stack(&Config::default());
    stack.realtime.set("/sensors/temperature", json!(20));
    stack.rules.put("too-hot", too_hot_rule());
    settle().await;

    stack.realtime.set("/sensors/temperature", json!(31));
    settle().await;
    stack.realtime.set("/sensors/temperature", json!(25));
    settle().await;

    let sent = stack.outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].token.as_str(), "device-a");
    assert_eq!(sent[0].notification.title, "Too hot");
    stack.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn should_stop_notifying_when_rule_removed() {
    let stack = stack(&Config::default());
    stack.rules.put("too-hot", too_hot_rule());
    settle().await;
    assert_eq!(stack.engine.manager().len(), 1);

    assert!(stack.rules.remove(&RuleId::new("too-hot")));
    settle().await;
    stack.realtime.set("/sensors/temperature", json!(40));
    settle().await;

    assert!(stack.engine.manager().is_empty());
    assert_eq!(stack.outbox.sent_count(), 0);
    stack.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn should_skip_invalid_rule_without_watcher() {
    let stack = stack(&Config::default());
    stack
        .rules
        .put("broken", json!({ "action": { "type": "webhook" } }));
    settle().await;

    let (_, body) = get_json(stack.engine.router(), "/api/rules").await;

    assert_eq!(body["rules"][0]["watching"], false);
    assert!(stack.engine.manager().is_empty());
    stack.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn should_throttle_interval_rule_to_one_fire_per_period() {
    let stack = stack(&Config::default());
    stack.realtime.set("/sensors/temperature", json!(35));
    let mut rule = too_hot_rule();
    rule["schedule"] = json!({ "unit": "minutes", "interval": 1 });
    stack.rules.put("too-hot", rule);
    settle().await;

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(stack.outbox.sent_count(), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    settle().await;
    assert_eq!(stack.outbox.sent_count(), 2);
    stack.engine.shutdown().await;
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn should_publish_liveness_from_heartbeat_changes() {
    let stack = stack(&Config::default());
    stack.realtime.set("/heartbeat", json!(5));

    let (_, before) = get_json(stack.engine.router(), "/api/liveness").await;
    assert_eq!(before["liveness"], "unknown");

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    let (_, first) = get_json(stack.engine.router(), "/api/liveness").await;
    assert_eq!(first["liveness"], "online");
    assert_eq!(stack.realtime.get("/is_online"), json!(true));

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    let (_, stale) = get_json(stack.engine.router(), "/api/liveness").await;
    assert_eq!(stale["liveness"], "offline");
    assert_eq!(stack.realtime.get("/is_online"), json!(false));

    stack.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn should_stay_online_when_simulator_bumps_heartbeat() {
    let mut config = Config::default();
    config.simulator.heartbeat_enabled = true;
    config.simulator.heartbeat_interval_secs = 25;
    let stack = stack(&config);

    // Half-period steps guarantee a bump strictly between two checks.
    for step in 1..=6 {
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        if step % 2 == 0 {
            assert_eq!(stack.realtime.get("/is_online"), json!(true), "step {step}");
        }
    }
    stack.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn should_report_unknown_liveness_when_watchdog_disabled() {
    let mut config = Config::default();
    config.heartbeat.enabled = false;
    let stack = stack(&config);

    let (_, body) = get_json(stack.engine.router(), "/api/liveness").await;

    assert_eq!(body["liveness"], "unknown");
    stack.engine.shutdown().await;
}
