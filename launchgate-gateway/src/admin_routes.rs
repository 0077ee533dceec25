use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use launchgate_protocol::api::ApiResponse;
use launchgate_protocol::event::{AppStats, Event, EventQuery, EventType, StatsWindow};
use launchgate_rules::{AuthorizationRule, RuleDraft};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::event_routes::MAX_FIELD_LEN;
use crate::routing::GatewayState;
use crate::security::enforce_auth;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    pub id: i64,
    #[serde(flatten)]
    pub draft: RuleDraft,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    pub app: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn router(state: GatewayState) -> Router {
    let protected = Router::new()
        .route("/api/auth/list", get(list_rules))
        .route("/api/auth/create", post(create_rule))
        .route("/api/auth/update", post(update_rule))
        .route("/api/auth/delete/:id", delete(delete_rule))
        .route("/api/events", get(list_events))
        .route("/api/stats", get(stats))
        .route_layer(middleware::from_fn_with_state(
            state.security.clone(),
            enforce_auth,
        ));

    Router::new()
        .route("/api/login", post(login))
        .merge(protected)
        .with_state(state)
}

async fn login(
    State(state): State<GatewayState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let Json(request) = body.map_err(|err| AppError::bad_request(err.body_text()))?;

    if !state
        .security
        .verify_credentials(&request.username, &request.password)
    {
        warn!(username = %request.username, "rejected administrator login");
        return Err(AppError::unauthorized("invalid username or password"));
    }

    let issued = state.security.issue_token(&request.username).map_err(|err| {
        warn!(error = %err, "failed to issue token");
        AppError::internal("failed to issue token")
    })?;
    info!(username = %request.username, "administrator logged in");

    Ok(Json(ApiResponse::ok(LoginResponse {
        token: issued.token,
        token_type: "bearer",
        expires_at: issued.expires_at,
    })))
}

async fn list_rules(
    State(state): State<GatewayState>,
) -> AppResult<Json<ApiResponse<Vec<AuthorizationRule>>>> {
    let rules = state.rules.list_rules().await?;
    Ok(Json(ApiResponse::ok(rules)))
}

async fn create_rule(
    State(state): State<GatewayState>,
    body: Result<Json<RuleDraft>, JsonRejection>,
) -> AppResult<Json<ApiResponse<AuthorizationRule>>> {
    let Json(draft) = body.map_err(|err| AppError::bad_request(err.body_text()))?;
    let draft = validate_draft(draft)?;

    let rule = state.rules.create_rule(draft).await?;
    info!(rule_id = rule.id, app = %rule.app, "authorization rule created");
    Ok(Json(ApiResponse::ok(rule)))
}

async fn update_rule(
    State(state): State<GatewayState>,
    body: Result<Json<UpdateRuleRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<AuthorizationRule>>> {
    let Json(request) = body.map_err(|err| AppError::bad_request(err.body_text()))?;
    let draft = validate_draft(request.draft)?;

    let rule = state.rules.update_rule(request.id, draft).await?;
    info!(rule_id = rule.id, app = %rule.app, "authorization rule updated");
    Ok(Json(ApiResponse::ok(rule)))
}

async fn delete_rule(
    State(state): State<GatewayState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let Path(id) = id.map_err(|err| AppError::bad_request(err.body_text()))?;

    state.rules.delete_rule(id).await?;
    info!(rule_id = id, "authorization rule deleted");
    Ok(Json(ApiResponse::empty()))
}

async fn list_events(
    State(state): State<GatewayState>,
    params: Result<Query<EventsParams>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<Event>>>> {
    let Query(params) = params.map_err(|err| AppError::bad_request(err.body_text()))?;

    let event_type = match non_empty(params.event_type) {
        Some(raw) => Some(
            raw.parse::<EventType>()
                .map_err(|err| AppError::bad_request(err.to_string()))?,
        ),
        None => None,
    };
    let query = EventQuery {
        app: non_empty(params.app),
        event_type,
    };

    let events = state.events.list_events(&query).await?;
    Ok(Json(ApiResponse::ok(events)))
}

async fn stats(
    State(state): State<GatewayState>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<AppStats>>>> {
    let Query(params) = params.map_err(|err| AppError::bad_request(err.body_text()))?;

    let window = StatsWindow {
        start: parse_optional_date("start_date", params.start_date)?,
        end: parse_optional_date("end_date", params.end_date)?,
    };

    let stats = state.events.stats(window).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

fn validate_draft(draft: RuleDraft) -> AppResult<RuleDraft> {
    let RuleDraft {
        app,
        version_rule,
        ip_rule,
        detail_info,
    } = draft;
    let app = app.trim().to_string();
    let version_rule = version_rule.trim().to_string();
    let ip_rule = ip_rule.trim().to_string();

    if app.is_empty() {
        return Err(AppError::bad_request("app must not be empty"));
    }
    if version_rule.is_empty() {
        return Err(AppError::bad_request("version_rule must not be empty"));
    }
    if ip_rule.is_empty() {
        return Err(AppError::bad_request("ip_rule must not be empty"));
    }
    if app.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::bad_request("app exceeds 50 characters"));
    }
    if version_rule.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::bad_request("version_rule exceeds 50 characters"));
    }

    Ok(RuleDraft {
        app,
        version_rule,
        ip_rule,
        detail_info,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_optional_date(field: &str, raw: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    match non_empty(raw) {
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| AppError::bad_request(format!("invalid {field}: {raw}"))),
        None => Ok(None),
    }
}

/// Accepts RFC 3339, naive date-times (read as UTC) and bare dates (midnight UTC).
pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(value.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}
