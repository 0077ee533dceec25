use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};
use thiserror::Error;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::config::SecurityConfig;
use crate::error::AppError;

/// Administrator identity extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub username: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Token issued on a successful login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct SecurityState {
    config: SecurityConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SecurityState {
    pub fn new(config: SecurityConfig) -> Self {
        let secret_bytes = decode_secret(&config.jwt_secret);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[config.jwt_audience.clone()]);
        validation.set_issuer(&[config.jwt_issuer.clone()]);

        Self {
            encoding_key: EncodingKey::from_secret(&secret_bytes),
            decoding_key: DecodingKey::from_secret(&secret_bytes),
            validation,
            config,
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let wildcard = self
            .config
            .cors_allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*");

        let origins: Vec<_> = self
            .config
            .cors_allowed_origins
            .iter()
            .filter(|origin| origin.trim() != "*")
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(%origin, ?err, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        let allow_origin = if wildcard || origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        };

        let methods = vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ];

        let headers = vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
        ];

        CorsLayer::new()
            .allow_methods(AllowMethods::list(methods))
            .allow_origin(allow_origin)
            .allow_headers(AllowHeaders::list(headers))
    }

    /// Compares submitted credentials with the configured administrator.
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        let matches = constant_time_eq(username.as_bytes(), self.config.admin_username.as_bytes())
            & constant_time_eq(password.as_bytes(), self.config.admin_password.as_bytes());
        matches.into()
    }

    pub fn issue_token(&self, username: &str) -> Result<IssuedToken, SecurityError> {
        let issued_at = Utc::now();
        let expires_at = i64::try_from(self.config.token_ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or(SecurityError::TokenLifetime(self.config.token_ttl_hours))?;
        let claims = AuthClaims {
            sub: username.to_string(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| SecurityError::Signing(err.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthContext, SecurityError> {
        let data = decode::<AuthClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| SecurityError::InvalidToken(err.to_string()))?;
        let claims = data.claims;

        Ok(AuthContext {
            username: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    pub fn audit_failure(&self, reason: &SecurityError, path: &str) {
        warn!(?reason, path, "authentication failure");
    }
}

/// Rejects administrative requests that lack a valid bearer token.
pub async fn enforce_auth(
    State(state): State<Arc<SecurityState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer(request.headers()).ok_or_else(|| {
        let err = SecurityError::MissingAuthorization;
        state.audit_failure(&err, &path);
        AppError::unauthorized(err.to_string())
    })?;

    let context = match state.validate_token(&token) {
        Ok(context) => context,
        Err(err) => {
            state.audit_failure(&err, &path);
            return Err(AppError::unauthorized("invalid or expired token"));
        }
    };

    debug!(username = %context.username, path, "authenticated request");
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn decode_secret(secret: &str) -> Vec<u8> {
    if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(secret) {
        if !decoded.is_empty() {
            return decoded;
        }
    }

    secret.as_bytes().to_vec()
}

/// Compares both inputs padded to the longer length, so neither the
/// position of the first difference nor a length mismatch shows in timing.
fn constant_time_eq(submitted: &[u8], expected: &[u8]) -> Choice {
    let len = submitted.len().max(expected.len());
    let mut left = vec![0u8; len];
    let mut right = vec![0xFFu8; len];
    left[..submitted.len()].copy_from_slice(submitted);
    right[..expected.len()].copy_from_slice(expected);

    let same_len = (submitted.len() as u64).ct_eq(&(expected.len() as u64));
    same_len & left.ct_eq(&right)
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaims {
    sub: String,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("missing Authorization header")]
    MissingAuthorization,
    #[error("invalid JWT: {0}")]
    InvalidToken(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("token lifetime of {0} hours is out of range")]
    TokenLifetime(u64),
}
