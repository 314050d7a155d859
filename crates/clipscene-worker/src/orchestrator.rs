//! Background pipelines and the submission boundary.
//!
//! Every submission validates synchronously, registers a record in the
//! [`JobStore`] and spawns one task that is the record's only writer.
//!
//! Three pipelines exist:
//! - **unified**: acquire the source, then extract each clip in order; any
//!   failure is fatal for the job, and the transient source is removed
//! - **acquisition**: legacy download-only flow producing a [`VideoRecord`]
//! - **clipping**: legacy clipping of an already downloaded video; a failed
//!   clip is logged and the remaining clips still run

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;

use clipscene_media::fs_utils::{latest_video_file, remove_file_if_exists};
use clipscene_media::{
    Acquirer, ClipExtractor, Ffmpeg, FormatCatalog, MediaError, MediaSource, ToolPool,
    Transcoder, YtDlp,
};
use clipscene_models::{
    ClipPreview, ClipResult, ClipSpec, FormatOption, JobId, JobKind, JobStatus, LatestVideo,
    ProcessingJob, VideoId, VideoRecord, VideoSummary,
};

use crate::archive::{archive_name, write_archive};
use crate::config::WorkerConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::store::{JobStore, JobWriter, VideoWriter};

/// Progress once the source video is on disk.
const PROGRESS_ACQUIRED: u8 = 30;
/// Progress when clip extraction begins.
const PROGRESS_PROCESSING: u8 = 40;
/// Share of the progress bar spent on clips in the unified pipeline.
const PROGRESS_CLIP_SPAN: usize = 50;

/// Pipeline name of the legacy download-only flow.
const ACQUISITION: &str = "acquisition";

/// Video id meaning "newest file in the download directory".
pub const LATEST_VIDEO_ID: &str = "latest";

/// Handle to a scheduled background task.
#[derive(Debug)]
pub struct Submission {
    /// Job or video identifier to poll
    pub id: String,
    /// Background task; awaiting it waits for the record to turn terminal
    pub task: JoinHandle<()>,
}

/// Result of a clip preview.
#[derive(Debug, Clone, Serialize)]
pub struct ClipPreviewSet {
    pub video_id: String,
    pub video: VideoSummary,
    pub clips: Vec<ClipPreview>,
}

/// Coordinates acquisition, extraction and cleanup against the job store.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<WorkerConfig>,
    store: JobStore,
    acquirer: Acquirer,
    extractor: ClipExtractor,
    catalog: FormatCatalog,
}

impl Orchestrator {
    /// Build an orchestrator over the given tool implementations.
    pub fn new(
        config: WorkerConfig,
        store: JobStore,
        source: Arc<dyn MediaSource>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let pool = ToolPool::new(config.max_tool_processes);
        let acquirer = Acquirer::new(source.clone(), pool.clone(), &config.download_dir);
        let extractor = ClipExtractor::new(transcoder, pool.clone(), &config.clips_dir)
            .with_timeout(config.clip_timeout);
        let catalog = FormatCatalog::new(source, pool);

        Self {
            config: Arc::new(config),
            store,
            acquirer,
            extractor,
            catalog,
        }
    }

    /// Orchestrator backed by the yt-dlp and FFmpeg executables from `config`.
    pub fn with_system_tools(config: WorkerConfig, store: JobStore) -> Self {
        let source = Arc::new(YtDlp::new(&config.ytdlp_bin));
        let transcoder = Arc::new(Ffmpeg::new(&config.ffmpeg_bin, &config.ffprobe_bin));
        Self::new(config, store, source, transcoder)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    // ---------------------------------------------------------------------
    // Submissions
    // ---------------------------------------------------------------------

    /// Start a legacy download of `url`, optionally at a specific format.
    pub async fn submit_acquisition(
        &self,
        url: &str,
        format_id: Option<String>,
    ) -> PipelineResult<Submission> {
        let url = validate_url(url)?;
        let format_id = format_id
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        let video_id = VideoId::new();
        let writer = self
            .store
            .insert_video(VideoRecord::new(video_id.clone(), &url, format_id.clone()))
            .await;
        metrics::record_job_submitted(ACQUISITION);

        let logger = JobLogger::new(video_id.as_str(), ACQUISITION);
        let span = logger.span();
        let this = self.clone();
        let task = tokio::spawn(
            async move { this.run_acquisition(writer, logger, url, format_id).await }
                .instrument(span),
        );

        Ok(Submission {
            id: video_id.to_string(),
            task,
        })
    }

    /// Start clipping an already downloaded video.
    ///
    /// With no video id (or `"latest"`), the newest video file in the
    /// download directory is used.
    pub async fn submit_clipping(
        &self,
        video_id: Option<&str>,
        clips: Vec<ClipSpec>,
    ) -> PipelineResult<Submission> {
        let (video_id, video) = self.resolve_video(video_id).await?;
        validate_clips(&clips)?;

        let job_id = JobId::new();
        let writer = self
            .store
            .insert_job(ProcessingJob::new_clipping(job_id.clone(), &video_id, clips.len()))
            .await;
        metrics::record_job_submitted(JobKind::Clipping.as_str());

        let logger = JobLogger::new(job_id.as_str(), JobKind::Clipping.as_str());
        let span = logger.span();
        let source = PathBuf::from(&video.file_path);
        let this = self.clone();
        let task = tokio::spawn(
            async move { this.run_clipping(writer, logger, source, clips).await }.instrument(span),
        );

        Ok(Submission {
            id: job_id.to_string(),
            task,
        })
    }

    /// Start the unified download-and-clip pipeline.
    pub async fn submit_unified(
        &self,
        url: &str,
        clips: Vec<ClipSpec>,
    ) -> PipelineResult<Submission> {
        let url = validate_url(url)?;
        validate_clips(&clips)?;

        let job_id = JobId::new();
        let writer = self
            .store
            .insert_job(ProcessingJob::new_unified(job_id.clone(), clips.len()))
            .await;
        metrics::record_job_submitted(JobKind::Unified.as_str());

        let logger = JobLogger::new(job_id.as_str(), JobKind::Unified.as_str());
        let span = logger.span();
        let this = self.clone();
        let task = tokio::spawn(
            async move { this.run_unified(writer, logger, url, clips).await }.instrument(span),
        );

        Ok(Submission {
            id: job_id.to_string(),
            task,
        })
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub async fn get_job(&self, job_id: &str) -> PipelineResult<ProcessingJob> {
        self.store
            .get_job(job_id)
            .await
            .ok_or_else(|| PipelineError::not_found("Job not found"))
    }

    pub async fn get_video(&self, video_id: &str) -> PipelineResult<VideoRecord> {
        self.store
            .get_video(video_id)
            .await
            .ok_or_else(|| PipelineError::not_found("Video not found"))
    }

    pub async fn list_completed_videos(&self) -> Vec<VideoSummary> {
        self.store.list_completed_videos().await
    }

    /// Selectable quality options for `url`; empty when the source cannot be queried.
    pub async fn list_formats(&self, url: &str) -> PipelineResult<Vec<FormatOption>> {
        let url = validate_url(url)?;
        Ok(self.catalog.list_formats(&url).await)
    }

    /// Newest video file in the download directory.
    pub async fn latest_video(&self) -> PipelineResult<LatestVideo> {
        latest_video_file(&self.config.download_dir)
            .await?
            .ok_or_else(|| PipelineError::not_found("No videos found in downloads folder"))
    }

    /// Describe the clips a clipping request would produce, without running it.
    pub async fn preview_clips(
        &self,
        video_id: Option<&str>,
        clips: &[ClipSpec],
    ) -> PipelineResult<ClipPreviewSet> {
        let (video_id, video) = self.resolve_video(video_id).await?;
        validate_clips(clips)?;

        Ok(ClipPreviewSet {
            video_id,
            video,
            clips: clips
                .iter()
                .enumerate()
                .map(|(i, clip)| clip.preview(i))
                .collect(),
        })
    }

    /// Package a completed job's clips into `{clips_dir}/clips_{job_id}.zip`.
    pub async fn create_archive(&self, job_id: &str) -> PipelineResult<PathBuf> {
        let job = self.get_job(job_id).await?;
        if job.status != JobStatus::Completed {
            return Err(PipelineError::validation("Job not completed yet"));
        }

        tokio::fs::create_dir_all(&self.config.clips_dir).await?;
        let dest = self.config.clips_dir.join(archive_name(job.id.as_str()));
        let files = job.clips.iter().map(|c| PathBuf::from(&c.file_path)).collect();
        write_archive(dest.clone(), files).await?;
        Ok(dest)
    }

    /// Source video for a clipping request, as `(video id, summary)`.
    async fn resolve_video(
        &self,
        video_id: Option<&str>,
    ) -> PipelineResult<(String, VideoSummary)> {
        let requested = video_id
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != LATEST_VIDEO_ID);

        match requested {
            Some(id) => {
                let video = self.get_video(id).await?;
                let summary = video
                    .summary()
                    .ok_or_else(|| PipelineError::validation("Video is not ready"))?;
                if !tokio::fs::try_exists(&summary.file_path).await? {
                    return Err(PipelineError::not_found("Video file not found"));
                }
                Ok((id.to_string(), summary))
            }
            None => {
                let latest = self.latest_video().await?;
                Ok((LATEST_VIDEO_ID.to_string(), latest.into()))
            }
        }
    }

    // ---------------------------------------------------------------------
    // Pipelines
    // ---------------------------------------------------------------------

    async fn run_unified(
        &self,
        job: JobWriter,
        logger: JobLogger,
        url: String,
        clips: Vec<ClipSpec>,
    ) {
        let started = Instant::now();
        let total = clips.len();
        logger.started(&url, total);

        let source = match self.acquirer.acquire(&url, job.id(), None).await {
            Ok(source) => source,
            Err(e) => {
                let err = PipelineError::Acquisition(e);
                self.fail_job(&job, &logger, JobKind::Unified, err).await;
                return;
            }
        };
        logger.acquired(&source.title, source.strategy, source.file_size);

        job.update(|j| {
            j.video_id = Some(j.id.to_string());
            j.set_step("Download completed!");
            j.set_progress(PROGRESS_ACQUIRED);
        })
        .await;
        job.update(|j| {
            j.set_status(JobStatus::Processing);
            j.set_step(format!("Processing {} clips...", total));
            j.set_progress(PROGRESS_PROCESSING);
        })
        .await;

        for (i, clip) in clips.iter().enumerate() {
            let title = clip.effective_title(i);
            let progress = PROGRESS_PROCESSING + (i * PROGRESS_CLIP_SPAN / total) as u8;
            logger.clip_started(i + 1, total, progress, &title);
            job.update(|j| {
                j.set_step(format!("Creating clip {} of {}: {}", i + 1, total, title));
                j.set_progress(progress);
            })
            .await;

            match self.extract(&source.path, clip, job.id(), i, &title).await {
                Ok(result) => {
                    metrics::record_clip_created();
                    job.update(|j| j.record_clip(result)).await;
                }
                Err(e) => {
                    metrics::record_clip_failed();
                    let err = PipelineError::ClipExtraction {
                        clip_number: i + 1,
                        source: e,
                    };
                    self.fail_job(&job, &logger, JobKind::Unified, err).await;
                    self.discard_source(&source.path, &logger).await;
                    return;
                }
            }
        }

        let done = match remove_file_if_exists(&source.path).await {
            Ok(()) => format!("Created {} clips", total),
            Err(e) => {
                logger.cleanup_failed(&source.path, &e);
                let warning = format!("Warning: could not remove source file: {}", e);
                job.update(|j| j.set_step(warning.clone())).await;
                format!("Created {} clips. {}", total, warning)
            }
        };

        job.update(|j| j.complete(done.clone())).await;
        // video ids share the job id namespace; a stale download record is dropped
        self.store.remove_video(job.id()).await;
        let elapsed = started.elapsed();
        metrics::record_job_completed(JobKind::Unified.as_str(), elapsed.as_secs_f64());
        logger.completed(&done, elapsed);
    }

    async fn run_acquisition(
        &self,
        video: VideoWriter,
        logger: JobLogger,
        url: String,
        format_id: Option<String>,
    ) {
        let started = Instant::now();
        logger.started(&url, 0);

        match self.acquirer.acquire(&url, video.id(), format_id.as_deref()).await {
            Ok(acquired) => {
                logger.acquired(&acquired.title, acquired.strategy, acquired.file_size);
                let path = acquired.path.to_string_lossy().to_string();
                video
                    .update(|v| v.complete(acquired.title.clone(), path, acquired.file_size))
                    .await;
                let elapsed = started.elapsed();
                metrics::record_job_completed(ACQUISITION, elapsed.as_secs_f64());
                logger.completed("Download completed!", elapsed);
            }
            Err(e) => {
                let message = e.to_string();
                logger.failed(&PipelineError::Acquisition(e));
                video.update(|v| v.fail(message)).await;
                metrics::record_job_failed(ACQUISITION);
            }
        }
    }

    async fn run_clipping(
        &self,
        job: JobWriter,
        logger: JobLogger,
        source: PathBuf,
        clips: Vec<ClipSpec>,
    ) {
        let started = Instant::now();
        let total = clips.len();
        let mut failed = 0usize;
        logger.started(&source.to_string_lossy(), total);

        for (i, clip) in clips.iter().enumerate() {
            let title = clip.effective_title(i);
            let progress = (i * 100 / total) as u8;
            logger.clip_started(i + 1, total, progress, &title);
            job.update(|j| {
                j.set_step(format!("Creating clip {} of {}: {}", i + 1, total, title));
                j.set_progress(progress);
            })
            .await;

            match self.extract(&source, clip, job.id(), i, &title).await {
                Ok(result) => {
                    metrics::record_clip_created();
                    job.update(|j| j.record_clip(result)).await;
                }
                Err(e) => {
                    metrics::record_clip_failed();
                    failed += 1;
                    logger.clip_skipped(&PipelineError::ClipExtraction {
                        clip_number: i + 1,
                        source: e,
                    });
                }
            }
        }

        let created = total - failed;
        let done = if failed == 0 {
            format!("Created {} of {} clips", created, total)
        } else {
            format!("Created {} of {} clips ({} failed)", created, total, failed)
        };
        job.update(|j| j.complete(done.clone())).await;
        let elapsed = started.elapsed();
        metrics::record_job_completed(JobKind::Clipping.as_str(), elapsed.as_secs_f64());
        logger.completed(&done, elapsed);
    }

    async fn extract(
        &self,
        source: &Path,
        clip: &ClipSpec,
        job_id: &str,
        index: usize,
        title: &str,
    ) -> Result<ClipResult, MediaError> {
        let extracted = self
            .extractor
            .extract(source, clip.start_time, clip.end_time, job_id, index, Some(title))
            .await?;

        Ok(ClipResult {
            index,
            title: title.to_string(),
            start_time: clip.start_time,
            end_time: clip.end_time,
            file_path: extracted.path.to_string_lossy().to_string(),
            file_size: extracted.file_size,
        })
    }

    async fn fail_job(
        &self,
        job: &JobWriter,
        logger: &JobLogger,
        kind: JobKind,
        err: PipelineError,
    ) {
        logger.failed(&err);
        let message = err.to_string();
        job.update(|j| j.fail(message)).await;
        metrics::record_job_failed(kind.as_str());
    }

    async fn discard_source(&self, path: &Path, logger: &JobLogger) {
        if let Err(e) = remove_file_if_exists(path).await {
            logger.cleanup_failed(path, &e);
        }
    }
}

fn validate_url(url: &str) -> PipelineResult<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(PipelineError::validation("Video URL is required"));
    }
    let parsed = url::Url::parse(url)
        .map_err(|e| PipelineError::validation(format!("Invalid video URL: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PipelineError::validation("Video URL must use http or https"));
    }
    Ok(url.to_string())
}

fn validate_clips(clips: &[ClipSpec]) -> PipelineResult<()> {
    if clips.is_empty() {
        return Err(PipelineError::validation("At least one clip is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("  https://youtu.be/abc ").is_ok());
        assert!(matches!(validate_url(""), Err(PipelineError::Validation(_))));
        assert!(matches!(validate_url("   "), Err(PipelineError::Validation(_))));
        assert!(matches!(validate_url("not a url"), Err(PipelineError::Validation(_))));
        assert!(matches!(validate_url("file:///etc/passwd"), Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_validate_clips() {
        assert!(validate_clips(&[]).is_err());
    }

    #[test]
    fn test_unified_clip_progress_stays_below_completion() {
        for total in 1..=7usize {
            for i in 0..total {
                let progress = PROGRESS_PROCESSING as usize + i * PROGRESS_CLIP_SPAN / total;
                assert!((40..90).contains(&progress));
            }
        }
    }
}
