//! Clip job handlers: submission, polling, preview and archive download.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use clipscene_models::{ClipSpec, ProcessingJob};
use clipscene_worker::archive::archive_name;
use clipscene_worker::ClipPreviewSet;

use super::StartedResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Download-and-clip request.
#[derive(Debug, Deserialize)]
pub struct CreateClipsFromVideoRequest {
    pub youtube_url: String,
    pub clips: Vec<ClipSpec>,
}

/// Clip request against an already downloaded video.
///
/// Without `video_id` the newest file in the download directory is used.
#[derive(Debug, Deserialize)]
pub struct CreateClipsRequest {
    #[serde(default)]
    pub video_id: Option<String>,
    pub clips: Vec<ClipSpec>,
}

/// Start the unified download-and-clip pipeline.
pub async fn create_clips_from_video(
    State(state): State<AppState>,
    Json(request): Json<CreateClipsFromVideoRequest>,
) -> ApiResult<Json<StartedResponse>> {
    let total = request.clips.len();
    let submission = state
        .orchestrator
        .submit_unified(&request.youtube_url, request.clips)
        .await?;
    info!(job_id = %submission.id, clips = total, "Unified job started");

    Ok(Json(StartedResponse::job(
        submission.id,
        format!("Processing {} clips", total),
    )))
}

/// Start clipping an already downloaded video.
pub async fn create_clips(
    State(state): State<AppState>,
    Json(request): Json<CreateClipsRequest>,
) -> ApiResult<Json<StartedResponse>> {
    let total = request.clips.len();
    let submission = state
        .orchestrator
        .submit_clipping(request.video_id.as_deref(), request.clips)
        .await?;
    info!(job_id = %submission.id, clips = total, "Clipping job started");

    Ok(Json(StartedResponse::job(
        submission.id,
        format!("Creating {} clips", total),
    )))
}

/// Snapshot of one processing job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ProcessingJob>> {
    Ok(Json(state.orchestrator.get_job(&job_id).await?))
}

/// Describe the clips a request would produce without running it.
pub async fn preview_clips(
    State(state): State<AppState>,
    Json(request): Json<CreateClipsRequest>,
) -> ApiResult<Json<ClipPreviewSet>> {
    let preview = state
        .orchestrator
        .preview_clips(request.video_id.as_deref(), &request.clips)
        .await?;
    Ok(Json(preview))
}

/// Zip of a completed job's clips.
pub async fn download_clips(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let path = state.orchestrator.create_archive(&job_id).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal(format!("failed to read archive: {}", e)))?;

    let disposition = format!("attachment; filename=\"{}\"", archive_name(&job_id));
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
