//! Request context and error rendering shared by every router.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::registry::UpstreamError;
use crate::session::{AccessError, Session, SessionError, SessionManager};
use crate::store::RepositoryError;
use crate::validation::ValidationError;

/// Explicit per-process context handed to routers instead of ambient globals.
#[derive(Clone)]
pub struct PortalContext {
    pub sessions: Arc<SessionManager>,
    pub clock: Arc<dyn Clock>,
}

impl PortalContext {
    pub fn new(sessions: Arc<SessionManager>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    /// Resolves the caller's session or produces a 401 that clears the cookie.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Session, ApiError> {
        self.sessions
            .authenticate(headers, self.clock.now())
            .map_err(|reason| {
                if matches!(reason, SessionError::Missing) {
                    debug!("request without session cookie");
                } else {
                    warn!(reason = %reason, "rejecting session cookie");
                }
                ApiError::Unauthorized {
                    reason: reason.to_string(),
                    clear_cookie: self.sessions.clear_cookie(),
                }
            })
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }
}

/// Error surfaced to HTTP callers.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized {
        reason: String,
        clear_cookie: String,
    },
    Forbidden(AccessError),
    Validation(ValidationError),
    NotFound(String),
    Conflict(String),
    Upstream(UpstreamError),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Unauthorized {
                reason,
                clear_cookie,
            } => {
                let body = Json(json!({ "error": "authentication required", "reason": reason }));
                (status, [(SET_COOKIE, clear_cookie)], body).into_response()
            }
            ApiError::Forbidden(err) => {
                (status, Json(json!({ "error": err.to_string() }))).into_response()
            }
            ApiError::Validation(err) => {
                let body = json!({ "error": err.message, "field": err.field });
                (status, Json(body)).into_response()
            }
            ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::Internal(message) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Upstream(err) => {
                let body = json!({ "error": err.to_string(), "retryable": true });
                (status, Json(body)).into_response()
            }
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(value: AccessError) -> Self {
        Self::Forbidden(value)
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<UpstreamError> for ApiError {
    fn from(value: UpstreamError) -> Self {
        warn!(error = %value, "upstream dependency failed");
        Self::Upstream(value)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound(value.to_string()),
            RepositoryError::Conflict(_) => Self::Conflict(value.to_string()),
            RepositoryError::Unavailable(_) => Self::Internal(value.to_string()),
        }
    }
}
