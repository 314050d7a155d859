//! Transcoding seam and its FFmpeg implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_duration;

/// Media inspection and transcoding.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Container duration in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Run a command, killing it once `timeout` elapses.
    async fn run(&self, command: &FfmpegCommand, timeout: Duration) -> MediaResult<()>;
}

/// `ffmpeg` and `ffprobe` command-line tools.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        probe_duration(&self.ffprobe, path).await
    }

    async fn run(&self, command: &FfmpegCommand, timeout: Duration) -> MediaResult<()> {
        FfmpegRunner::new(&self.ffmpeg)
            .with_timeout(timeout)
            .run(command)
            .await
    }
}
