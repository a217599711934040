//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use alerthub_app::ports::{PushSender, RealtimeStore, RuleStore, UserDirectory};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and includes a [`TraceLayer`] that
/// logs each HTTP request/response at the `DEBUG` level.
pub fn build<RuleS, RS, UD, PS>(state: AppState<RuleS, RS, UD, PS>) -> Router
where
    RuleS: RuleStore + Send + Sync + 'static,
    RS: RealtimeStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
    PS: PushSender + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::AppState;
    use alerthub_adapter_virtual::{
        InMemoryRealtimeStore, InMemoryRuleStore, InMemoryUserDirectory, LoggingPushSender,
    };
    use alerthub_app::watcher::{Pipeline, WatchMode, WatcherManager};
    use alerthub_domain::heartbeat::Liveness;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tokio::sync::watch;
    use tower::ServiceExt;

    type Realtime = InMemoryRealtimeStore;
    type Users = InMemoryUserDirectory;
    type TestState = AppState<InMemoryRuleStore, Realtime, Users, LoggingPushSender>;

    struct Harness {
        rules: Arc<InMemoryRuleStore>,
        realtime: Arc<InMemoryRealtimeStore>,
        manager: Arc<WatcherManager<Realtime, Users, LoggingPushSender>>,
        liveness: watch::Sender<Liveness>,
        state: TestState,
    }

    fn harness() -> Harness {
        let rules = Arc::new(InMemoryRuleStore::default());
        let realtime = Arc::new(InMemoryRealtimeStore::default());
        let pipeline = Arc::new(Pipeline::new(
            InMemoryUserDirectory::default(),
            LoggingPushSender::default(),
        ));
        let manager = Arc::new(WatcherManager::new(Arc::clone(&realtime), pipeline));
        let (liveness, receiver) = watch::channel(Liveness::Unknown);
        let state = AppState::new(
            Arc::clone(&rules),
            Arc::clone(&realtime),
            Arc::clone(&manager),
            receiver,
        );
        Harness {
            rules,
            realtime,
            manager,
            liveness,
            state,
        }
    }

    fn rule(path: &str) -> Value {
        json!({
            "action": { "type": "notification", "payload": { "title": "t", "text": "b" } },
            "condition": { "source": "rtdb", "path": path, "operator": ">", "value": 10 }
        })
    }

    async fn get_json(state: TestState, uri: &str) -> (StatusCode, Value) {
        let response = build(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(harness().state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_rules_with_watcher_status() {
        let h = harness();
        h.rules.put("r1", rule("/a"));
        h.rules.put("r2", json!({ "action": { "type": "webhook" } }));
        assert_eq!(h.manager.start("r1".into(), &rule("/a")), Some(WatchMode::Event));

        let (status, body) = get_json(h.state, "/api/rules").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["rules"][0]["id"], "r1");
        assert_eq!(body["rules"][0]["watching"], true);
        assert_eq!(body["rules"][0]["mode"], "event");
        assert_eq!(body["rules"][1]["id"], "r2");
        assert_eq!(body["rules"][1]["watching"], false);
        assert!(body["rules"][1].get("mode").is_none());

        h.manager.stop_all().await;
    }

    #[tokio::test]
    async fn should_return_empty_list_when_no_rules_stored() {
        let (status, body) = get_json(harness().state, "/api/rules").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "count": 0, "rules": [] }));
    }

    #[tokio::test]
    async fn should_read_realtime_value_at_path() {
        let h = harness();
        h.realtime.set("/sensors/temperature", json!(21.5));

        let (status, body) = get_json(h.state, "/api/realtime?path=/sensors/temperature").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "/sensors/temperature");
        assert_eq!(body["value"], json!(21.5));
        assert!(body["read_at"].is_string());
    }

    #[tokio::test]
    async fn should_return_null_when_path_absent() {
        let (status, body) = get_json(harness().state, "/api/realtime?path=/missing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], Value::Null);
    }

    #[tokio::test]
    async fn should_return_bad_request_when_path_blank() {
        let (status, body) = get_json(harness().state, "/api/realtime?path=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn should_report_current_liveness() {
        let h = harness();
        let state = h.state.clone();

        let (_, before) = get_json(h.state, "/api/liveness").await;
        h.liveness.send_replace(Liveness::Online);
        let (status, after) = get_json(state, "/api/liveness").await;

        assert_eq!(before, json!({ "liveness": "unknown" }));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(after, json!({ "liveness": "online" }));
    }
}
