use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("source not found: {0}")]
    SourceNotFound(String),
    #[error("backend failure: {0}")]
    BackendFailure(String),
    #[error("knowledge index is empty")]
    EmptyIndex,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        ApiError::BackendFailure(err.to_string())
    }

    pub fn is_backend_failure(&self) -> bool {
        matches!(self, ApiError::BackendFailure(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // Backend and internal details stay in the log, not in the response body.
        let (status, message) = match &self {
            ApiError::Configuration(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service is not configured".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::SourceNotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BackendFailure(_) => (
                StatusCode::BAD_GATEWAY,
                "Generation failed, please try again later".to_string(),
            ),
            ApiError::EmptyIndex => (
                StatusCode::CONFLICT,
                "Knowledge index is empty".to_string(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
