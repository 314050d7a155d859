//! Clip request and result models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timestamp::{format_duration, Timestamp};

/// A requested clip: an optional title and a time range into the source.
///
/// The `start_time < end_time` ordering is not checked here; the clip
/// extractor rejects inverted ranges before invoking any tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl ClipSpec {
    pub fn new(title: Option<&str>, start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            title: title.map(str::to_string),
            start_time,
            end_time,
        }
    }

    /// Title shown for this clip, falling back to `Clip {index + 1}`.
    pub fn effective_title(&self, index: usize) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Clip {}", index + 1),
        }
    }

    /// Preview of this clip without producing it.
    pub fn preview(&self, index: usize) -> ClipPreview {
        ClipPreview {
            index,
            title: self.effective_title(index),
            start_time: self.start_time,
            end_time: self.end_time,
            duration: format_duration(self.start_time, self.end_time),
        }
    }
}

/// A produced clip. Immutable once appended to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipResult {
    /// Position in the originating request (0-based)
    pub index: usize,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub file_path: String,
    pub file_size: u64,
}

/// Clip summary returned by the preview operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipPreview {
    pub index: usize,
    pub title: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Clip length as `HH:MM:SS`
    pub duration: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_effective_title_fallback() {
        let untitled = ClipSpec::new(None, ts("00:00:10"), ts("00:00:20"));
        assert_eq!(untitled.effective_title(0), "Clip 1");

        let blank = ClipSpec::new(Some("   "), ts("00:00:10"), ts("00:00:20"));
        assert_eq!(blank.effective_title(2), "Clip 3");

        let titled = ClipSpec::new(Some("Intro"), ts("00:00:10"), ts("00:00:20"));
        assert_eq!(titled.effective_title(5), "Intro");
    }

    #[test]
    fn test_preview_duration() {
        let clip = ClipSpec::new(Some("Goal"), ts("00:01:00"), ts("00:02:30"));
        let preview = clip.preview(1);
        assert_eq!(preview.index, 1);
        assert_eq!(preview.title, "Goal");
        assert_eq!(preview.duration, "00:01:30");
    }

    #[test]
    fn test_deserialize_request_shape() {
        let clip: ClipSpec = serde_json::from_str(
            r#"{"title": null, "start_time": "00:00:10", "end_time": "00:00:20"}"#,
        )
        .unwrap();
        assert_eq!(clip.title, None);
        assert_eq!(clip.start_time.as_secs(), 10);
        assert_eq!(clip.end_time.as_secs(), 20);
    }
}
