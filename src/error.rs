use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Crate-wide error type, mapped onto HTTP statuses at the edge.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown video, rendition or segment. Deliberately carries no detail
    /// so the three causes are indistinguishable in a response.
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Queue(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        // Response bodies stay generic: no paths, no internal messages.
        let detail = match status {
            StatusCode::NOT_FOUND => "Not found.",
            StatusCode::UNAUTHORIZED => "Authentication credentials were not provided.",
            StatusCode::BAD_REQUEST => "Bad request.",
            _ => "Internal server error.",
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
