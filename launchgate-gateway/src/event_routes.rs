use std::net::SocketAddr;

use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use launchgate_protocol::api::ApiResponse;
use launchgate_protocol::event::{EventType, NewEvent};
use launchgate_rules::{Decision, RuleEngine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::client_ip::resolve_client_ip;
use crate::error::{AppError, AppResult};
use crate::routing::GatewayState;

pub(crate) const MAX_FIELD_LEN: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LifecycleQuery {
    pub app: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StartGranted {
    pub detail_info: String,
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/event/start", get(start_event))
        .route("/api/event/stop", get(stop_event))
        .with_state(state)
}

async fn start_event(
    State(state): State<GatewayState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    query: Result<Query<LifecycleQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<StartGranted>>> {
    let query = validate(query)?;
    let client_ip = resolve_client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.trust_proxy_headers,
    );

    let decision =
        RuleEngine::authorize(state.rules.as_ref(), &query.app, &query.version, &client_ip)
            .await?;

    match decision {
        Decision::Granted { detail } => {
            state
                .events
                .record_event(NewEvent::start(
                    query.app.as_str(),
                    query.version.as_str(),
                    truncate(&client_ip),
                ))
                .await?;
            info!(app = %query.app, version = %query.version, %client_ip, "start granted");
            Ok(Json(ApiResponse::ok(StartGranted { detail_info: detail })))
        }
        Decision::Denied => {
            info!(app = %query.app, version = %query.version, %client_ip, "start denied");
            Err(AppError::forbidden("unauthorized access"))
        }
    }
}

async fn stop_event(
    State(state): State<GatewayState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    query: Result<Query<LifecycleQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let query = validate(query)?;
    let client_ip = resolve_client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.trust_proxy_headers,
    );

    state
        .events
        .record_event(NewEvent::now(
            EventType::Stop,
            query.app.as_str(),
            query.version.as_str(),
            truncate(&client_ip),
        ))
        .await?;
    info!(app = %query.app, version = %query.version, %client_ip, "stop recorded");

    Ok(Json(ApiResponse::ok(json!({}))))
}

fn validate(query: Result<Query<LifecycleQuery>, QueryRejection>) -> AppResult<LifecycleQuery> {
    let Query(query) = query.map_err(|err| AppError::bad_request(err.body_text()))?;

    if query.app.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::bad_request("app exceeds 50 characters"));
    }
    if query.version.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::bad_request("version exceeds 50 characters"));
    }

    Ok(query)
}

fn truncate(client_ip: &str) -> String {
    client_ip.chars().take(MAX_FIELD_LEN).collect()
}
