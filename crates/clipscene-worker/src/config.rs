//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory for downloaded source videos
    pub download_dir: PathBuf,
    /// Directory for extracted clips and archives
    pub clips_dir: PathBuf,
    /// Maximum concurrent yt-dlp / FFmpeg / FFprobe processes
    pub max_tool_processes: usize,
    /// Wall-clock limit for one clip extraction
    pub clip_timeout: Duration,
    /// yt-dlp executable
    pub ytdlp_bin: String,
    /// FFmpeg executable
    pub ffmpeg_bin: String,
    /// FFprobe executable
    pub ffprobe_bin: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            clips_dir: PathBuf::from("clips"),
            max_tool_processes: 2,
            clip_timeout: Duration::from_secs(300), // 5 minutes
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            download_dir: std::env::var("CLIPSCENE_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            clips_dir: std::env::var("CLIPSCENE_CLIPS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.clips_dir),
            max_tool_processes: std::env::var("CLIPSCENE_MAX_TOOL_PROCESSES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_tool_processes),
            clip_timeout: Duration::from_secs(
                std::env::var("CLIPSCENE_CLIP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            ytdlp_bin: std::env::var("YTDLP_BIN").unwrap_or(defaults.ytdlp_bin),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: std::env::var("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
        }
    }

    /// Config rooted at `base`, with `downloads/` and `clips/` beneath it.
    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            download_dir: base.join("downloads"),
            clips_dir: base.join("clips"),
            ..Self::default()
        }
    }

    /// Create the download and clips directories if missing.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        tokio::fs::create_dir_all(&self.clips_dir).await?;
        Ok(())
    }

    /// External tools that cannot be found, as `(name, configured binary)`.
    pub fn missing_tools(&self) -> Vec<(&'static str, String)> {
        [
            ("yt-dlp", &self.ytdlp_bin),
            ("ffmpeg", &self.ffmpeg_bin),
            ("ffprobe", &self.ffprobe_bin),
        ]
        .into_iter()
        .filter(|(_, bin)| which::which(bin.as_str()).is_err())
        .map(|(name, bin)| (name, bin.clone()))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.clips_dir, PathBuf::from("clips"));
        assert_eq!(config.max_tool_processes, 2);
        assert_eq!(config.clip_timeout, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_ensure_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = WorkerConfig::with_base_dir(dir.path().join("data"));
        config.ensure_dirs().await.unwrap();
        assert!(config.download_dir.is_dir());
        assert!(config.clips_dir.is_dir());
    }

    #[test]
    fn test_missing_tools_reports_unknown_binary() {
        let config = WorkerConfig {
            ffmpeg_bin: "definitely-not-installed-ffmpeg".to_string(),
            ..WorkerConfig::default()
        };
        assert!(config
            .missing_tools()
            .iter()
            .any(|(name, _)| *name == "ffmpeg"));
    }
}
