//! Error handling module for the Lodge backend.
//!
//! Provides a centralized error type mapped to HTTP status codes and the
//! `{ "error": … }` response envelope the frontend consumes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Application error type.
///
/// Upstream failures are logged at the call site and never surface detail to
/// the caller; everything else carries the user-visible message directly.
#[derive(Debug)]
pub enum AppError {
    /// No (or unusable) session cookie
    NotAuthenticated,
    /// Authenticated but lacking permission (wrong team, non-admin)
    Forbidden(String),
    /// User/team/project/item absent
    NotFound(String),
    /// Missing/malformed input or business-rule violation
    Validation(String),
    /// External store or external API failure
    Upstream(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message surfaced to the caller.
    ///
    /// Upstream detail stays in the logs; callers only see a generic message.
    pub fn message(&self) -> String {
        match self {
            AppError::NotAuthenticated => "Not authenticated".to_string(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Upstream(_) => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotAuthenticated => write!(f, "not authenticated"),
            AppError::Forbidden(msg) => write!(f, "forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Validation(msg) => write!(f, "validation: {}", msg),
            AppError::Upstream(msg) => write!(f, "upstream: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("External request error: {:?}", err);
        AppError::Upstream(format!("External request error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Upstream(format!("JSON error: {}", err))
    }
}

/// Error response envelope: a flat message, nothing structured.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.message(),
        };
        (status, Json(body)).into_response()
    }
}
