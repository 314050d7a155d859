//! Video acquisition and lookup handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use clipscene_models::{LatestVideo, VideoRecord, VideoSummary};

use super::StartedResponse;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadVideoRequest {
    pub youtube_url: String,
    #[serde(default)]
    pub format_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoSummary>,
}

/// Start a download-only job.
pub async fn download_video(
    State(state): State<AppState>,
    Json(request): Json<DownloadVideoRequest>,
) -> ApiResult<Json<StartedResponse>> {
    let submission = state
        .orchestrator
        .submit_acquisition(&request.youtube_url, request.format_id)
        .await?;
    info!(video_id = %submission.id, "Video download started");

    Ok(Json(StartedResponse::video(
        submission.id,
        "Video download started",
    )))
}

/// Snapshot of one download.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoRecord>> {
    Ok(Json(state.orchestrator.get_video(&video_id).await?))
}

/// Completed downloads in submission order.
pub async fn list_videos(State(state): State<AppState>) -> Json<VideoListResponse> {
    Json(VideoListResponse {
        videos: state.orchestrator.list_completed_videos().await,
    })
}

/// Newest video file in the download directory.
pub async fn latest_video(State(state): State<AppState>) -> ApiResult<Json<LatestVideo>> {
    Ok(Json(state.orchestrator.latest_video().await?))
}
