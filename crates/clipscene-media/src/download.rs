//! Source acquisition with tiered format fallback.
//!
//! Strategies are tried in order until one succeeds:
//!
//! 1. `primary`: the requested format merged with the best audio, or a
//!    descending resolution chain when no format was requested
//! 2. `best-mp4`: best single-file mp4, no merging
//! 3. `lowest`: whatever the source serves as its worst quality
//!
//! Every failed tier is recorded in an [`AttemptLog`] that ends up in the
//! final error when all tiers fail.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{AttemptLog, MediaError, MediaResult};
use crate::fs_utils::{find_prefixed_file, sanitize_id, title_from_path};
use crate::pool::ToolPool;
use crate::source::{DownloadOutcome, DownloadRequest, MediaSource};

/// Resolution chain used when the caller did not pick a format.
pub const AUTO_QUALITY_CHAIN: &str = "bestvideo[height<=2160]+bestaudio/\
bestvideo[height<=1440]+bestaudio/\
bestvideo[height<=1080]+bestaudio/\
bestvideo[height<=720]+bestaudio/\
best";

/// Container separate video and audio streams are merged into.
const MERGE_CONTAINER: &str = "mp4";

/// One named way of asking the source for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadStrategy {
    pub name: &'static str,
    pub format: String,
    pub merge: bool,
}

impl DownloadStrategy {
    /// Requested format plus best audio, or the auto quality chain.
    pub fn primary(selector: Option<&str>) -> Self {
        let format = match selector {
            Some(selector) => format!("{}+bestaudio", selector),
            None => AUTO_QUALITY_CHAIN.to_string(),
        };
        Self {
            name: "primary",
            format,
            merge: true,
        }
    }

    pub fn best_mp4() -> Self {
        Self {
            name: "best-mp4",
            format: "best[ext=mp4]".to_string(),
            merge: false,
        }
    }

    pub fn lowest() -> Self {
        Self {
            name: "lowest",
            format: "worst".to_string(),
            merge: false,
        }
    }

    /// Build the tool request for this strategy.
    pub fn request(&self, url: &str, output_template: &str) -> DownloadRequest {
        let request = DownloadRequest::new(url, output_template, &self.format);
        if self.merge {
            request.merge_into(MERGE_CONTAINER)
        } else {
            request
        }
    }
}

/// Ordered fallback chain for a download.
pub fn strategies_for(selector: Option<&str>) -> Vec<DownloadStrategy> {
    let selector = selector.map(str::trim).filter(|s| !s.is_empty());
    vec![
        DownloadStrategy::primary(selector),
        DownloadStrategy::best_mp4(),
        DownloadStrategy::lowest(),
    ]
}

/// A source video stored locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredVideo {
    pub path: PathBuf,
    pub title: String,
    pub file_size: u64,
    /// Strategy that produced the file
    pub strategy: &'static str,
}

/// Fetches remote videos into the download directory.
#[derive(Clone)]
pub struct Acquirer {
    source: Arc<dyn MediaSource>,
    pool: ToolPool,
    download_dir: PathBuf,
}

impl Acquirer {
    pub fn new(
        source: Arc<dyn MediaSource>,
        pool: ToolPool,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            pool,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Download `url` for `job_id`, walking the fallback chain.
    pub async fn acquire(
        &self,
        url: &str,
        job_id: &str,
        selector: Option<&str>,
    ) -> MediaResult<AcquiredVideo> {
        let id = sanitize_id(job_id);
        let template = self
            .download_dir
            .join(format!("{}_%(title)s.%(ext)s", id))
            .to_string_lossy()
            .to_string();

        let started = Instant::now();
        let mut attempts = AttemptLog::new();

        for strategy in strategies_for(selector) {
            let request = strategy.request(url, &template);
            info!(
                job_id = %job_id,
                strategy = strategy.name,
                format = %strategy.format,
                "Downloading source video"
            );

            let result = {
                let _permit = self.pool.acquire().await?;
                self.source.download(&request).await
            };

            match result {
                Ok(outcome) => {
                    metrics::counter!(
                        "clipscene_download_attempts_total",
                        "strategy" => strategy.name,
                        "outcome" => "success"
                    )
                    .increment(1);
                    let path = self.locate(&outcome, &id).await?;
                    let file_size = fs::metadata(&path).await?.len();
                    let title = title_from_path(&path, &id);

                    metrics::histogram!("clipscene_download_duration_seconds")
                        .record(started.elapsed().as_secs_f64());
                    info!(
                        job_id = %job_id,
                        strategy = strategy.name,
                        path = %path.display(),
                        size_mb = file_size as f64 / (1024.0 * 1024.0),
                        "Downloaded video successfully"
                    );

                    return Ok(AcquiredVideo {
                        path,
                        title,
                        file_size,
                        strategy: strategy.name,
                    });
                }
                Err(e) => {
                    metrics::counter!(
                        "clipscene_download_attempts_total",
                        "strategy" => strategy.name,
                        "outcome" => "failure"
                    )
                    .increment(1);
                    warn!(
                        job_id = %job_id,
                        strategy = strategy.name,
                        error = %e,
                        "Download strategy failed"
                    );
                    attempts.push(strategy.name, e.to_string());
                }
            }
        }

        Err(MediaError::AcquisitionFailed { attempts })
    }

    /// Path reported by the tool if it exists, else a prefix scan of the directory.
    async fn locate(&self, outcome: &DownloadOutcome, id: &str) -> MediaResult<PathBuf> {
        if let Some(reported) = &outcome.reported_path {
            if fs::try_exists(reported).await.unwrap_or(false) {
                return Ok(reported.clone());
            }
        }

        find_prefixed_file(&self.download_dir, id)
            .await?
            .ok_or_else(|| {
                MediaError::FileNotFound(self.download_dir.join(format!("{}_*", id)))
            })
    }
}
