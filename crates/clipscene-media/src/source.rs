//! Remote media source seam and its yt-dlp implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{last_stderr_line, MediaError, MediaResult};

/// Declarative description of one yt-dlp download invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// yt-dlp output template, e.g. `downloads/abc_%(title)s.%(ext)s`
    pub output_template: String,
    /// Format expression passed to `-f`
    pub format: String,
    /// Container to merge separate streams into
    pub merge_output_format: Option<String>,
    pub no_playlist: bool,
}

impl DownloadRequest {
    pub fn new(
        url: impl Into<String>,
        output_template: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            output_template: output_template.into(),
            format: format.into(),
            merge_output_format: None,
            no_playlist: true,
        }
    }

    pub fn merge_into(mut self, container: impl Into<String>) -> Self {
        self.merge_output_format = Some(container.into());
        self
    }

    /// Command-line arguments for yt-dlp.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-progress".to_string(),
            "--no-warnings".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ];
        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }
        args.push("-f".to_string());
        args.push(self.format.clone());
        if let Some(container) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }
        args.push("-o".to_string());
        args.push(self.output_template.clone());
        args.push(self.url.clone());
        args
    }
}

/// What the source tool reported after a successful download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Final file path printed by the tool, if any
    pub reported_path: Option<PathBuf>,
}

/// One entry of the source's format list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub fps: Option<f64>,
    /// Bytes; some extractors report fractional estimates
    #[serde(default)]
    pub filesize: Option<f64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

/// Metadata-only view of a remote video.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// Remote video source.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch metadata and the format list without downloading media.
    async fn fetch_info(&self, url: &str) -> MediaResult<SourceInfo>;

    /// Run one download attempt.
    async fn download(&self, request: &DownloadRequest) -> MediaResult<DownloadOutcome>;
}

/// `yt-dlp` command-line tool.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn resolve(&self) -> MediaResult<PathBuf> {
        which::which(&self.binary)
            .map_err(|e| MediaError::YtDlpNotFound(format!("{}: {}", self.binary.display(), e)))
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    async fn fetch_info(&self, url: &str) -> MediaResult<SourceInfo> {
        let binary = self.resolve()?;

        let output = Command::new(binary)
            .args(["-J", "--skip-download", "--no-playlist", "--no-warnings"])
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::download_failed(format!(
                "yt-dlp metadata query failed: {}",
                last_stderr_line(&stderr)
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn download(&self, request: &DownloadRequest) -> MediaResult<DownloadOutcome> {
        let binary = self.resolve()?;
        let args = request.to_args();
        debug!("Running yt-dlp: {} {}", binary.display(), args.join(" "));

        let output = Command::new(binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(MediaError::download_failed(format!(
                "yt-dlp failed: {}",
                last_stderr_line(&stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(DownloadOutcome {
            reported_path: reported_path(&stdout),
        })
    }
}

/// Final line printed by `--print after_move:filepath`.
fn reported_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}
