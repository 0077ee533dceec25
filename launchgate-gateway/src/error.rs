use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use launchgate_core::errors::LaunchGateError;
use launchgate_protocol::api::ApiError;
use launchgate_rules::RuleError;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

/// HTTP-facing error carrying the status and the message sent to the client.
#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new<M: Into<String>>(status: StatusCode, message: M) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ApiError {
            code: self.status.as_u16(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<RuleError> for AppError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::NotFound(_) => AppError::not_found("authorization rule not found"),
            other => {
                error!(error = %other, "rule store failure");
                AppError::internal("rule store unavailable")
            }
        }
    }
}

impl From<LaunchGateError> for AppError {
    fn from(err: LaunchGateError) -> Self {
        match err {
            LaunchGateError::NotFound(message) => AppError::not_found(message),
            other => {
                error!(error = %other, "event store failure");
                AppError::internal("event store unavailable")
            }
        }
    }
}
