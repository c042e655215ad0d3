use crate::{
    catalog::VideoView,
    error::{AppError, Result},
    metrics,
    server::state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub sku: String,
    pub count: usize,
    pub videos: Vec<VideoView>,
    pub timestamp: String,
}

/// Streamable videos tagged with a SKU
pub async fn videos_by_sku(
    Path(sku): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<VideosResponse>> {
    let start = Instant::now();

    if sku.trim().is_empty() {
        metrics::record_request("videos", 400);
        return Err(sku_required());
    }

    info!("📡 API request for SKU: {}", sku);

    let result = state.catalog.videos_for_sku(&sku).await;
    metrics::record_duration("videos", start);

    match result {
        Ok(videos) => {
            metrics::record_request("videos", 200);
            Ok(Json(VideosResponse {
                sku,
                count: videos.len(),
                videos,
                timestamp: Utc::now().to_rfc3339(),
            }))
        }
        Err(e) => {
            metrics::record_request("videos", 500);
            Err(e)
        }
    }
}

/// `/videos` and `/videos/` with no SKU segment
pub async fn missing_sku() -> AppError {
    metrics::record_request("videos", 400);
    sku_required()
}

fn sku_required() -> AppError {
    AppError::BadRequest("SKU parameter is required".to_string())
}
