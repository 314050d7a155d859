//! Lifecycle events of one background job.
//!
//! Every event carries `job_id` and `kind` so a job can be followed across
//! acquisition, per-clip extraction and cleanup.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn, Span};

use clipscene_media::MediaError;

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    kind: &'static str,
}

impl JobLogger {
    /// `kind` is the pipeline name: `unified`, `clipping` or `acquisition`.
    pub fn new(job_id: impl Into<String>, kind: &'static str) -> Self {
        Self {
            job_id: job_id.into(),
            kind,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Span the job's task runs in.
    pub fn span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, kind = self.kind)
    }

    pub fn started(&self, source: &str, clips: usize) {
        info!(job_id = %self.job_id, kind = self.kind, source, clips, "Job started");
    }

    pub fn acquired(&self, title: &str, strategy: &str, file_size: u64) {
        info!(
            job_id = %self.job_id,
            kind = self.kind,
            title,
            strategy,
            file_size,
            "Source acquired"
        );
    }

    pub fn clip_started(&self, clip_number: usize, total: usize, progress: u8, title: &str) {
        info!(
            job_id = %self.job_id,
            kind = self.kind,
            clip = clip_number,
            total,
            progress,
            title,
            "Extracting clip"
        );
    }

    /// A clip failed but the job carries on.
    pub fn clip_skipped(&self, err: &PipelineError) {
        warn!(
            job_id = %self.job_id,
            kind = self.kind,
            error_kind = err.kind(),
            tool_error = err.media_error().map(MediaError::kind),
            error = %err,
            "Clip skipped"
        );
    }

    /// The job is being marked `error`.
    pub fn failed(&self, err: &PipelineError) {
        error!(
            job_id = %self.job_id,
            kind = self.kind,
            error_kind = err.kind(),
            tool_error = err.media_error().map(MediaError::kind),
            error = %err,
            "Job failed"
        );
    }

    pub fn cleanup_failed(&self, path: &Path, err: &MediaError) {
        warn!(
            job_id = %self.job_id,
            kind = self.kind,
            path = %path.display(),
            error = %err,
            "Could not remove source file"
        );
    }

    pub fn completed(&self, step: &str, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            kind = self.kind,
            elapsed_ms = elapsed.as_millis() as u64,
            step,
            "Job completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipscene_models::{JobId, JobKind};

    #[test]
    fn test_logger_identity() {
        let job_id = JobId::new();
        let logger = JobLogger::new(job_id.as_str(), JobKind::Unified.as_str());
        assert_eq!(logger.job_id(), job_id.as_str());
        assert_eq!(logger.kind(), "unified");
    }

    #[test]
    fn test_events_accept_pipeline_errors() {
        let logger = JobLogger::new("video-123", "acquisition");
        let err = PipelineError::Acquisition(MediaError::download_failed("HTTP Error 403"));
        logger.failed(&err);
        logger.clip_skipped(&PipelineError::not_found("gone"));
        logger.cleanup_failed(
            Path::new("downloads/video-123_x.mp4"),
            &MediaError::FileNotFound("x".into()),
        );
    }
}
