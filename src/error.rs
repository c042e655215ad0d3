use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors raised while refreshing the catalog or answering a query.
///
/// Asset-level variants (`InvalidIdentifier`, `UpstreamDetail`) are absorbed by
/// the refresh pipeline and only logged. They exist as values so callers can
/// decide whether to drop an asset or abort.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid asset identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Listing page {page} failed: {reason}")]
    UpstreamPage { page: u32, reason: String },

    #[error("Detail fetch for asset {id} failed: {reason}")]
    UpstreamDetail { id: String, reason: String },

    /// No snapshot could be produced and none was cached before.
    #[error("Catalog refresh failed: {0}")]
    Refresh(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error",
                        "message": other.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}
