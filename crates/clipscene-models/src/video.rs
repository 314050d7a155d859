//! Downloaded video records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobId;

/// Identifier of an acquired video.
///
/// Shares its value space with [`JobId`]: a unified job records its own id
/// as the video id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn new() -> Self {
        Self(JobId::new().0)
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&JobId> for VideoId {
    fn from(id: &JobId) -> Self {
        VideoId(id.as_str().to_string())
    }
}

/// Lifecycle of an acquisition-only record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    #[default]
    Downloading,
    Completed,
    Error,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Downloading => "downloading",
            VideoStatus::Completed => "completed",
            VideoStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Error)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source video fetched by the legacy download flow.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    pub id: VideoId,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    pub status: VideoStatus,
    pub current_step: String,
    pub title: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// New record in the `downloading` state.
    pub fn new(id: VideoId, source_url: impl Into<String>, format_id: Option<String>) -> Self {
        let now = Utc::now();
        let current_step = match &format_id {
            Some(format) => format!("Downloading video (format: {})...", format),
            None => "Downloading video (auto quality)...".to_string(),
        };
        Self {
            id,
            source_url: source_url.into(),
            format_id,
            status: VideoStatus::Downloading,
            current_step,
            title: None,
            file_path: None,
            file_size: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == VideoStatus::Completed
    }

    /// Record a successful download. Ignored once terminal.
    pub fn complete(
        &mut self,
        title: impl Into<String>,
        file_path: impl Into<String>,
        file_size: u64,
    ) {
        if self.status.is_terminal() {
            return;
        }
        self.status = VideoStatus::Completed;
        self.current_step = "Download completed!".to_string();
        self.title = Some(title.into());
        self.file_path = Some(file_path.into());
        self.file_size = Some(file_size);
        self.updated_at = Utc::now();
    }

    /// Record a failed download. Ignored once terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        let error = error.into();
        self.status = VideoStatus::Error;
        self.current_step = format!("Download failed: {}", error);
        self.error = Some(error);
        self.updated_at = Utc::now();
    }

    /// Listing view, available only for completed records.
    pub fn summary(&self) -> Option<VideoSummary> {
        if !self.is_completed() {
            return None;
        }
        Some(VideoSummary {
            video_id: self.id.as_str().to_string(),
            title: self.title.clone().unwrap_or_default(),
            file_path: self.file_path.clone().unwrap_or_default(),
            file_size: self.file_size.unwrap_or(0),
            source_url: Some(self.source_url.clone()),
        })
    }
}

/// A video a clipping request can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub file_path: String,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Newest video file found in the download directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LatestVideo {
    pub filename: String,
    pub title: String,
    pub size: u64,
    pub path: String,
}

impl From<LatestVideo> for VideoSummary {
    fn from(latest: LatestVideo) -> Self {
        Self {
            video_id: "latest".to_string(),
            title: latest.title,
            file_path: latest.path,
            file_size: latest.size,
            source_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_step_mentions_format() {
        let record = VideoRecord::new(VideoId::new(), "https://example.com/v", Some("137".into()));
        assert_eq!(record.current_step, "Downloading video (format: 137)...");

        let record = VideoRecord::new(VideoId::new(), "https://example.com/v", None);
        assert_eq!(record.current_step, "Downloading video (auto quality)...");
        assert_eq!(record.status, VideoStatus::Downloading);
    }

    #[test]
    fn test_complete_and_summary() {
        let mut record = VideoRecord::new(VideoId::from_string("v1"), "u", None);
        assert!(record.summary().is_none());

        record.complete("My Video", "downloads/v1_My Video.mp4", 4096);
        assert_eq!(record.current_step, "Download completed!");

        let summary = record.summary().unwrap();
        assert_eq!(summary.video_id, "v1");
        assert_eq!(summary.title, "My Video");
        assert_eq!(summary.file_size, 4096);
        assert_eq!(summary.source_url.as_deref(), Some("u"));
    }

    #[test]
    fn test_terminal_record_is_frozen() {
        let mut record = VideoRecord::new(VideoId::new(), "u", None);
        record.fail("network down");
        record.complete("t", "p", 1);
        assert_eq!(record.status, VideoStatus::Error);
        assert_eq!(record.error.as_deref(), Some("network down"));
        assert!(record.file_path.is_none());
    }
}
