//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    create_clips, create_clips_from_video, download_clips, download_video, get_job, get_video,
    health, latest_video, list_video_formats, list_videos, preview_clips, root,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let video_routes = Router::new()
        .route("/download-video", post(download_video))
        .route("/video/:video_id", get(get_video))
        .route("/videos", get(list_videos))
        .route("/video-formats", post(list_video_formats))
        .route("/latest-video", get(latest_video));

    let job_routes = Router::new()
        .route("/create-clips-from-video", post(create_clips_from_video))
        .route("/create-clips", post(create_clips))
        .route("/preview-clips", post(preview_clips))
        .route("/job/:job_id", get(get_job))
        .route("/download/:job_id", get(download_clips));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // produced clips are served as static files
    let clips = ServeDir::new(&state.orchestrator.config().clips_dir);

    Router::new()
        .merge(video_routes)
        .merge(job_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .nest_service("/downloads", clips)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
