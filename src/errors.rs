use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;

use crate::external::series_source::{SeriesKind, SourceError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to fetch {kind} data: {reason}")]
    Fetch {
        kind: SeriesKind,
        #[source]
        reason: SourceError,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Market data is still loading")]
    Loading,
    #[error("Market data unavailable: {0}")]
    LoadFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("External error: {0}")]
    External(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Loading => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("2"));
                (StatusCode::SERVICE_UNAVAILABLE, headers, "Market data is still loading").into_response()
            },
            AppError::LoadFailed(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            e @ AppError::Fetch { .. } => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
        }
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
