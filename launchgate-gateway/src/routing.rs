use std::sync::Arc;

use axum::Router;
use launchgate_rules::RuleStore;
use tower_http::trace::TraceLayer;

use crate::admin_routes::router as admin_router;
use crate::config::GatewayConfig;
use crate::event_routes::router as event_router;
use crate::events::EventStore;
use crate::health::router as health_router;
use crate::security::SecurityState;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub rules: Arc<dyn RuleStore>,
    pub events: Arc<dyn EventStore>,
    pub security: Arc<SecurityState>,
    pub trust_proxy_headers: bool,
}

impl GatewayState {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        events: Arc<dyn EventStore>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            rules,
            events,
            security: Arc::new(SecurityState::new(config.security().clone())),
            trust_proxy_headers: config.trust_proxy_headers,
        }
    }
}

pub fn build_router(state: GatewayState) -> Router {
    let cors = state.security.cors_layer();

    Router::new()
        .merge(event_router(state.clone()))
        .merge(admin_router(state))
        .merge(health_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use launchgate_core::config::CoreConfig;
    use launchgate_protocol::event::EventQuery;
    use launchgate_rules::{AuthorizationRule, RuleDraft, RuleError};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::SecurityConfig;
    use crate::repository::SqliteStore;

    fn config() -> GatewayConfig {
        GatewayConfig::new(
            CoreConfig::default(),
            SecurityConfig::with_secret("router-test-secret"),
        )
    }

    async fn harness() -> (Router, SqliteStore, GatewayState) {
        let store = SqliteStore::in_memory().await.expect("store");
        let state = GatewayState::new(Arc::new(store.clone()), Arc::new(store.clone()), &config());
        (build_router(state.clone()), store, state)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    fn get(uri: &str, ip: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-real-ip", ip)
            .body(Body::empty())
            .expect("request")
    }

    fn admin(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    async fn login(router: &Router) -> String {
        let request = Request::builder()
            .method("POST")
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"username": "admin", "password": "admin"}).to_string(),
            ))
            .expect("request");
        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (router, _, _) = harness().await;
        let (status, body) = send(&router, get("/health", "10.0.0.1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn granted_start_records_one_event() {
        let (router, store, _) = harness().await;
        store
            .create_rule(RuleDraft::new("foo", ">=1.0.0", "10.0.0.0/8", "X"))
            .await
            .expect("rule");

        let (status, body) = send(&router, get("/api/event/start?app=foo&version=1.2.0", "10.1.2.3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"code": 200, "data": {"detail_info": "X"}}));

        let events = store.list_events(&EventQuery::default()).await.expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].client_ip, "10.1.2.3");
    }

    #[tokio::test]
    async fn denied_start_records_nothing() {
        let (router, store, _) = harness().await;
        store
            .create_rule(RuleDraft::new("foo", ">=1.0.0", "10.0.0.0/8", "X"))
            .await
            .expect("rule");

        let (status, body) = send(&router, get("/api/event/start?app=foo&version=0.9.0", "10.1.2.3")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"code": 403, "message": "unauthorized access"}));

        let (status, _) = send(&router, get("/api/event/start?app=foo&version=1.0.0", "172.16.0.1")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let events = store.list_events(&EventQuery::default()).await.expect("events");
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn stop_is_always_recorded() {
        let (router, store, _) = harness().await;
        let (status, body) = send(&router, get("/api/event/stop?app=foo&version=1.0.0", "10.0.0.1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"code": 200, "data": {}}));

        let events = store.list_events(&EventQuery::default()).await.expect("events");
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn lifecycle_queries_are_validated() {
        let (router, _, _) = harness().await;
        let (status, _) = send(&router, get("/api/event/start?app=foo", "10.0.0.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/event/stop?app={}&version=1.0.0", "a".repeat(51));
        let (status, _) = send(&router, get(&uri, "10.0.0.1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    struct UnavailableRules;

    #[async_trait]
    impl RuleStore for UnavailableRules {
        async fn list_rules(&self) -> Result<Vec<AuthorizationRule>, RuleError> {
            Err(RuleError::storage("connection refused"))
        }

        async fn list_rules_for_app(&self, _app: &str) -> Result<Vec<AuthorizationRule>, RuleError> {
            Err(RuleError::storage("connection refused"))
        }

        async fn get_rule(&self, _id: i64) -> Result<Option<AuthorizationRule>, RuleError> {
            Err(RuleError::storage("connection refused"))
        }

        async fn create_rule(&self, _draft: RuleDraft) -> Result<AuthorizationRule, RuleError> {
            Err(RuleError::storage("connection refused"))
        }

        async fn update_rule(
            &self,
            _id: i64,
            _draft: RuleDraft,
        ) -> Result<AuthorizationRule, RuleError> {
            Err(RuleError::storage("connection refused"))
        }

        async fn delete_rule(&self, _id: i64) -> Result<(), RuleError> {
            Err(RuleError::storage("connection refused"))
        }
    }

    #[tokio::test]
    async fn store_outage_is_a_server_error() {
        let events = SqliteStore::in_memory().await.expect("store");
        let state = GatewayState::new(Arc::new(UnavailableRules), Arc::new(events.clone()), &config());
        let router = build_router(state);

        let (status, body) = send(&router, get("/api/event/start?app=foo&version=1.0.0", "10.0.0.1")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 500);
        assert!(events
            .list_events(&EventQuery::default())
            .await
            .expect("events")
            .is_empty());
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let (router, _, _) = harness().await;
        let (status, body) = send(&router, get("/api/auth/list", "10.0.0.1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);

        let (status, _) = send(&router, admin("GET", "/api/stats", "not-a-token", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let (router, _, _) = harness().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"username": "admin", "password": "wrong"}).to_string(),
            ))
            .expect("request");
        let (status, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn manages_rules_through_the_admin_api() {
        let (router, _, _) = harness().await;
        let token = login(&router).await;

        let draft = json!({
            "app": "foo",
            "version_rule": "1.0.0-2.0.0",
            "ip_rule": "192.168.1.*",
            "detail_info": "X"
        });
        let (status, body) = send(&router, admin("POST", "/api/auth/create", &token, Some(draft))).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["data"]["id"].as_i64().expect("id");

        let (status, _) = send(&router, get("/api/event/start?app=foo&version=1.5.0", "192.168.1.20")).await;
        assert_eq!(status, StatusCode::OK);

        let update = json!({
            "id": id,
            "app": "foo",
            "version_rule": ">=3.0.0",
            "ip_rule": "192.168.1.*",
            "detail_info": "Y"
        });
        let (status, body) = send(&router, admin("POST", "/api/auth/update", &token, Some(update))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["detail_info"], "Y");

        let (status, _) = send(&router, get("/api/event/start?app=foo&version=1.5.0", "192.168.1.20")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&router, admin("GET", "/api/auth/list", &token, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let uri = format!("/api/auth/delete/{id}");
        let (status, body) = send(&router, admin("DELETE", &uri, &token, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"code": 200}));

        let (status, _) = send(&router, admin("DELETE", &uri, &token, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_invalid_drafts() {
        let (router, _, _) = harness().await;
        let token = login(&router).await;

        let draft = json!({"app": "", "version_rule": "1.0", "ip_rule": "10.0.0.1"});
        let (status, _) = send(&router, admin("POST", "/api/auth/create", &token, Some(draft))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let update = json!({"id": 99, "app": "foo", "version_rule": "1.0", "ip_rule": "10.0.0.1"});
        let (status, _) = send(&router, admin("POST", "/api/auth/update", &token, Some(update))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reports_events_and_stats() {
        let (router, store, _) = harness().await;
        store
            .create_rule(RuleDraft::new("foo", ">=0.0.0", "0.0.0.0/0", "X"))
            .await
            .expect("rule");
        let token = login(&router).await;

        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.1"] {
            let (status, _) = send(&router, get("/api/event/start?app=foo&version=1.0.0", ip)).await;
            assert_eq!(status, StatusCode::OK);
        }
        send(&router, get("/api/event/stop?app=foo&version=1.0.0", "10.0.0.1")).await;

        let (status, body) = send(&router, admin("GET", "/api/events?app=foo&event_type=stop", &token, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let (status, body) = send(&router, admin("GET", "/api/stats", &token, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!([{"app": "foo", "start_count": 3, "stop_count": 1, "unique_ips": 2}])
        );

        let (status, body) = send(&router, admin("GET", "/api/stats?start_date=2999-01-01", &token, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));

        let (status, _) = send(&router, admin("GET", "/api/stats?end_date=soon", &token, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&router, admin("GET", "/api/events?event_type=pause", &token, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
