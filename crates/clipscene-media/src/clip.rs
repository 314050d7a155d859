//! Clip extraction: cuts one validated time range into its own file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{info, warn};

use clipscene_models::{EncodingConfig, Timestamp};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{clip_file_name, remove_file_if_exists};
use crate::pool::ToolPool;
use crate::transcode::Transcoder;

/// Outputs smaller than this are treated as failed encodes.
pub const MIN_CLIP_FILE_SIZE: u64 = 1024;

/// Default wall-clock limit for one extraction.
pub const DEFAULT_CLIP_TIMEOUT: Duration = Duration::from_secs(300);

/// A clip written to the clips directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClip {
    pub path: PathBuf,
    pub file_size: u64,
}

/// Cuts clips out of local source files.
#[derive(Clone)]
pub struct ClipExtractor {
    transcoder: Arc<dyn Transcoder>,
    pool: ToolPool,
    clips_dir: PathBuf,
    encoding: EncodingConfig,
    timeout: Duration,
}

impl ClipExtractor {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        pool: ToolPool,
        clips_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transcoder,
            pool,
            clips_dir: clips_dir.into(),
            encoding: EncodingConfig::default(),
            timeout: DEFAULT_CLIP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn clips_dir(&self) -> &Path {
        &self.clips_dir
    }

    /// Extract `[start, end)` of `source` as clip number `index + 1` of `job_id`.
    ///
    /// Validation happens before any tool runs: the source must exist,
    /// `start < end`, and `end` must not pass the probed duration. A failed
    /// probe is logged and skipped.
    pub async fn extract(
        &self,
        source: &Path,
        start: Timestamp,
        end: Timestamp,
        job_id: &str,
        index: usize,
        title: Option<&str>,
    ) -> MediaResult<ExtractedClip> {
        if !fs::try_exists(source).await.unwrap_or(false) {
            return Err(MediaError::SourceNotFound(source.to_path_buf()));
        }

        let duration_secs = start
            .until(end)
            .ok_or(MediaError::InvalidRange { start, end })?;

        let probed = {
            let _permit = self.pool.acquire().await?;
            self.transcoder.probe_duration(source).await
        };
        match probed {
            Ok(duration) if end.as_secs_f64() > duration => {
                return Err(MediaError::ExceedsDuration { end, duration });
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    clip = index + 1,
                    error = %e,
                    "Could not probe source duration, skipping bounds check"
                );
            }
        }

        fs::create_dir_all(&self.clips_dir).await?;
        let output = self
            .clips_dir
            .join(clip_file_name(job_id, index, title.unwrap_or("")));

        let cmd = FfmpegCommand::new(source, &output)
            .seek(start.as_secs_f64())
            .duration(f64::from(duration_secs))
            .encoding(&self.encoding);

        info!(
            job_id = %job_id,
            clip = index + 1,
            start = %start,
            end = %end,
            output = %output.display(),
            "Extracting clip"
        );

        let started = Instant::now();
        let result = {
            let _permit = self.pool.acquire().await?;
            self.transcoder.run(&cmd, self.timeout).await
        };

        if let Err(e) = result {
            discard_partial(&output).await;
            return Err(e);
        }

        let file_size = match fs::metadata(&output).await {
            Ok(metadata) => metadata.len(),
            Err(_) => return Err(MediaError::FileNotFound(output)),
        };
        if file_size < MIN_CLIP_FILE_SIZE {
            discard_partial(&output).await;
            return Err(MediaError::OutputTooSmall {
                path: output,
                size: file_size,
            });
        }

        metrics::histogram!("clipscene_clip_extraction_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        info!(job_id = %job_id, clip = index + 1, size = file_size, "Clip created");

        Ok(ExtractedClip {
            path: output,
            file_size,
        })
    }
}

async fn discard_partial(output: &Path) {
    if let Err(e) = remove_file_if_exists(output).await {
        warn!(output = %output.display(), error = %e, "Failed to remove partial clip");
    }
}
