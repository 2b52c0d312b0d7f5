pub mod models;
pub mod schema;
pub mod state;
pub mod utils;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Standard JSON failure body: `{error, details?}` with a 4xx/5xx status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            details: None,
        }),
    )
}

/// 500 with a generic message; the underlying cause goes to the server log
/// only.
pub fn internal_error(context: &str, err: impl std::fmt::Display) -> ApiError {
    log::error!("{context}: {err}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

pub fn db_unavailable(err: impl std::fmt::Display) -> ApiError {
    internal_error("Database connection failed", err)
}
