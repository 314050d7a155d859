//! Error types for media operations.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use clipscene_models::Timestamp;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// One failed acquisition strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: String,
    pub diagnostic: String,
}

/// Ordered record of failed acquisition strategies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptLog(Vec<Attempt>);

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, strategy: impl Into<String>, diagnostic: impl Into<String>) {
        self.0.push(Attempt {
            strategy: strategy.into(),
            diagnostic: diagnostic.into(),
        });
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttemptLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", attempt.strategy, attempt.diagnostic)?;
        }
        Ok(())
    }
}

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(String),

    #[error("FFprobe not found: {0}")]
    FfprobeNotFound(String),

    #[error("yt-dlp not found: {0}")]
    YtDlpNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("All download strategies failed ({attempts})")]
    AcquisitionFailed { attempts: AttemptLog },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Source video not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Start time {start} must be before end time {end}")]
    InvalidRange { start: Timestamp, end: Timestamp },

    #[error("End time {end} exceeds video duration {duration:.2}s")]
    ExceedsDuration { end: Timestamp, duration: f64 },

    #[error("Output file {path} is too small ({size} bytes)")]
    OutputTooSmall { path: PathBuf, size: u64 },

    #[error("Timed out after {secs} seconds: {message}")]
    Timeout {
        secs: u64,
        message: String,
        stderr: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create an ffprobe failure error.
    pub fn ffprobe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfprobeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create a timeout error keeping whatever the tool printed before it was killed.
    pub fn timed_out(secs: u64, stderr: String) -> Self {
        Self::Timeout {
            secs,
            message: last_stderr_line(&stderr).to_string(),
            stderr: (!stderr.is_empty()).then_some(stderr),
        }
    }

    /// Short machine-readable name of the failure, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::FfmpegNotFound(_)
            | MediaError::FfprobeNotFound(_)
            | MediaError::YtDlpNotFound(_) => "tool_missing",
            MediaError::FfmpegFailed { .. } | MediaError::FfprobeFailed { .. } => "tool_failed",
            MediaError::DownloadFailed { .. } | MediaError::AcquisitionFailed { .. } => "download",
            MediaError::FileNotFound(_) | MediaError::SourceNotFound(_) => "missing_file",
            MediaError::InvalidRange { .. } => "invalid_range",
            MediaError::ExceedsDuration { .. } => "exceeds_duration",
            MediaError::OutputTooSmall { .. } => "output_too_small",
            MediaError::Timeout { .. } => "timeout",
            MediaError::Io(_) => "io",
            MediaError::JsonParse(_) => "json",
            MediaError::ResourceLimit(_) => "resource_limit",
        }
    }

    /// Errors raised before any external tool was invoked.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MediaError::SourceNotFound(_)
                | MediaError::InvalidRange { .. }
                | MediaError::ExceedsDuration { .. }
        )
    }
}

/// Last non-empty line of a tool's stderr, the usual place for its diagnosis.
pub fn last_stderr_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Unknown error")
}
