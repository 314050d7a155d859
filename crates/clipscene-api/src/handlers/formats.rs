//! Format listing handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use clipscene_models::FormatOption;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VideoFormatsRequest {
    pub youtube_url: String,
}

#[derive(Debug, Serialize)]
pub struct VideoFormatsResponse {
    pub formats: Vec<FormatOption>,
}

/// Selectable quality options for a URL. Tool failures yield an empty list.
pub async fn list_video_formats(
    State(state): State<AppState>,
    Json(request): Json<VideoFormatsRequest>,
) -> ApiResult<Json<VideoFormatsResponse>> {
    let formats = state.orchestrator.list_formats(&request.youtube_url).await?;
    Ok(Json(VideoFormatsResponse { formats }))
}
