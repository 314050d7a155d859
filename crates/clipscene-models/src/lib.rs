//! Shared data models for the ClipScene backend.
//!
//! This crate provides Serde-serializable types for:
//! - Processing jobs, their kinds and lifecycle status
//! - Downloaded video records
//! - Clip requests and clip results
//! - Quality options reported by the format catalog
//! - Timestamp parsing and the clip encoding profile

pub mod clip;
pub mod encoding;
pub mod format;
pub mod job;
pub mod timestamp;
pub mod video;

// Re-export common types
pub use clip::{ClipPreview, ClipResult, ClipSpec};
pub use encoding::EncodingConfig;
pub use format::FormatOption;
pub use job::{JobId, JobKind, JobRecord, JobStatus, ProcessingJob};
pub use timestamp::{Timestamp, TimestampError};
pub use video::{LatestVideo, VideoId, VideoRecord, VideoStatus, VideoSummary};
