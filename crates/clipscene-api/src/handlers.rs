//! Request handlers.

pub mod formats;
pub mod health;
pub mod jobs;
pub mod videos;

pub use formats::*;
pub use health::*;
pub use jobs::*;
pub use videos::*;

use serde::Serialize;

/// Response to a submission that started a background task.
#[derive(Debug, Serialize)]
pub struct StartedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub status: &'static str,
    pub message: String,
}

impl StartedResponse {
    pub fn job(job_id: String, message: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id),
            video_id: None,
            status: "started",
            message: message.into(),
        }
    }

    pub fn video(video_id: String, message: impl Into<String>) -> Self {
        Self {
            job_id: None,
            video_id: Some(video_id),
            status: "started",
            message: message.into(),
        }
    }
}
