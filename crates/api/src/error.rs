use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use posefill_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every variant renders as `{ "error": message, "code": CODE }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
        CoreError::OutOfRange { .. } => (StatusCode::NOT_FOUND, "OUT_OF_RANGE", message),
        CoreError::NotInitialized(_) => (StatusCode::NOT_FOUND, "NOT_INITIALIZED", message),
        CoreError::SampleUnavailable { .. } => {
            (StatusCode::CONFLICT, "SAMPLE_UNAVAILABLE", message)
        }
        CoreError::GapTooWide { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "GAP_TOO_WIDE", message),
        CoreError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, "INVALID_TRANSITION", message)
        }
        CoreError::CursorNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
        CoreError::Storage(msg) => {
            tracing::error!(error = %msg, "Sample storage error");
            (
                StatusCode::BAD_GATEWAY,
                "STORAGE_ERROR",
                "Sample storage is unavailable".to_string(),
            )
        }
    }
}
