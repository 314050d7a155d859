//! Processing job definitions and lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::clip::ClipResult;
use crate::video::{VideoId, VideoRecord};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which pipeline produced a processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Clips cut from an already downloaded video (legacy two-phase flow)
    Clipping,
    /// Download and clipping under one job
    Unified,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Clipping => "clipping",
            JobKind::Unified => "unified",
        }
    }
}

/// Processing job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Source video is being fetched
    #[default]
    Downloading,
    /// Clips are being extracted
    Processing,
    /// All work finished
    Completed,
    /// Job stopped on a fatal error
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clipping job as seen by polling clients.
///
/// Mutated only by the task that owns it; readers get clones.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingJob {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub current_step: String,
    pub total_clips: usize,
    pub completed_clips: usize,
    pub clips: Vec<ClipResult>,
    /// Progress percentage (0-100), never decreases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingJob {
    /// Create a job for the unified download-and-clip pipeline.
    pub fn new_unified(id: JobId, total_clips: usize) -> Self {
        Self::new(id, JobKind::Unified, JobStatus::Downloading, total_clips, "Starting download...")
    }

    /// Create a job that clips an already downloaded video.
    pub fn new_clipping(id: JobId, video_id: impl Into<String>, total_clips: usize) -> Self {
        let mut job = Self::new(
            id,
            JobKind::Clipping,
            JobStatus::Processing,
            total_clips,
            "Starting clip creation...",
        );
        job.video_id = Some(video_id.into());
        job
    }

    fn new(id: JobId, kind: JobKind, status: JobStatus, total_clips: usize, step: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            status,
            current_step: step.to_string(),
            total_clips,
            completed_clips: 0,
            clips: Vec::new(),
            progress: Some(0),
            video_id: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to a new non-terminal status. Ignored once the job is terminal.
    pub fn set_status(&mut self, status: JobStatus) {
        if self.is_terminal() {
            return;
        }
        self.status = status;
        self.touch();
    }

    /// Update the human-readable step.
    pub fn set_step(&mut self, step: impl Into<String>) {
        self.current_step = step.into();
        self.touch();
    }

    /// Update progress. Values below the current progress are ignored.
    pub fn set_progress(&mut self, progress: u8) {
        let progress = progress.min(100);
        self.progress = Some(self.progress.map_or(progress, |p| p.max(progress)));
        self.touch();
    }

    /// Append a finished clip.
    pub fn record_clip(&mut self, clip: ClipResult) {
        self.clips.push(clip);
        self.completed_clips += 1;
        self.touch();
    }

    /// Mark job as completed.
    pub fn complete(&mut self, step: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.status = JobStatus::Completed;
        self.current_step = step.into();
        self.set_progress(100);
    }

    /// Mark job as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        let error = error.into();
        self.status = JobStatus::Error;
        self.current_step = format!("Failed: {}", error);
        self.error = Some(error);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Any record held by the job store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum JobRecord {
    /// Acquisition-only record (legacy download flow)
    Video(VideoRecord),
    /// Clipping or unified job
    Processing(ProcessingJob),
}

impl JobRecord {
    pub fn id(&self) -> &str {
        match self {
            JobRecord::Video(v) => v.id.as_str(),
            JobRecord::Processing(j) => j.id.as_str(),
        }
    }

    pub fn as_video(&self) -> Option<&VideoRecord> {
        match self {
            JobRecord::Video(v) => Some(v),
            JobRecord::Processing(_) => None,
        }
    }

    pub fn as_job(&self) -> Option<&ProcessingJob> {
        match self {
            JobRecord::Processing(j) => Some(j),
            JobRecord::Video(_) => None,
        }
    }
}

impl From<VideoRecord> for JobRecord {
    fn from(video: VideoRecord) -> Self {
        JobRecord::Video(video)
    }
}

impl From<ProcessingJob> for JobRecord {
    fn from(job: ProcessingJob) -> Self {
        JobRecord::Processing(job)
    }
}

impl From<&VideoId> for JobId {
    fn from(id: &VideoId) -> Self {
        JobId(id.as_str().to_string())
    }
}
