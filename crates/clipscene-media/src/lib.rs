//! yt-dlp and FFmpeg CLI wrappers.
//!
//! This crate provides:
//! - Tool seams (`MediaSource`, `Transcoder`) with command-line implementations
//! - Type-safe FFmpeg command building and a timeout-aware runner
//! - The format catalog, tiered source acquisition and clip extraction
//! - A bounded pool limiting concurrent tool processes

pub mod clip;
pub mod command;
pub mod download;
pub mod error;
pub mod formats;
pub mod fs_utils;
pub mod pool;
pub mod probe;
pub mod source;
pub mod transcode;

pub use clip::{ClipExtractor, ExtractedClip, MIN_CLIP_FILE_SIZE};
pub use command::{FfmpegCommand, FfmpegRunner};
pub use download::{strategies_for, AcquiredVideo, Acquirer, DownloadStrategy};
pub use error::{Attempt, AttemptLog, MediaError, MediaResult};
pub use formats::{select_quality_options, FormatCatalog};
pub use pool::ToolPool;
pub use source::{DownloadOutcome, DownloadRequest, MediaSource, RawFormat, SourceInfo, YtDlp};
pub use transcode::{Ffmpeg, Transcoder};
