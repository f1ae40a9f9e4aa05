//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use interview_core::InterviewError;

/// Errors that stop the server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// An error returned from a handler as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 404 for a role with no questions, listing the roles that have some.
    #[error("{message}")]
    UnknownRole {
        message: String,
        available_roles: Vec<String>,
    },

    /// 500
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<InterviewError> for ApiError {
    fn from(err: InterviewError) -> Self {
        match err {
            InterviewError::Validation(msg) => ApiError::BadRequest(msg),
            InterviewError::SessionNotFound(_) => ApiError::NotFound("Session not found".into()),
            InterviewError::NoQuestionsForRole {
                role,
                available_roles,
            } => ApiError::UnknownRole {
                message: format!("No questions found for job role: {role}"),
                available_roles,
            },
            other @ (InterviewError::Repository(_) | InterviewError::Store(_)) => {
                tracing::error!("request failed: {other}");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::UnknownRole { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::UnknownRole {
                message,
                available_roles,
            } => json!({ "error": message, "availableRoles": available_roles }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
