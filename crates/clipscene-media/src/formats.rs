//! Format catalog: reduces a source's format list to a few quality options.

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

use clipscene_models::format::parse_height;
use clipscene_models::FormatOption;

use crate::pool::ToolPool;
use crate::source::{MediaSource, RawFormat};

/// Upper bound on options offered to the user.
pub const MAX_QUALITY_OPTIONS: usize = 4;

/// Container accepted for user-selectable options.
const CANONICAL_EXT: &str = "mp4";

/// Queries a media source for selectable qualities.
#[derive(Clone)]
pub struct FormatCatalog {
    source: Arc<dyn MediaSource>,
    pool: ToolPool,
}

impl FormatCatalog {
    pub fn new(source: Arc<dyn MediaSource>, pool: ToolPool) -> Self {
        Self { source, pool }
    }

    /// Ranked quality options for `url`. Tool failures yield an empty list.
    pub async fn list_formats(&self, url: &str) -> Vec<FormatOption> {
        let info = {
            let _permit = match self.pool.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(url = %url, error = %e, "Could not acquire tool slot for format listing");
                    return Vec::new();
                }
            };
            self.source.fetch_info(url).await
        };

        match info {
            Ok(info) => {
                let options = select_quality_options(&info.formats);
                debug!(
                    url = %url,
                    total = info.formats.len(),
                    kept = options.len(),
                    "Listed formats"
                );
                options
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Format listing failed");
                Vec::new()
            }
        }
    }
}

/// Quality score used to pick one format per resolution.
pub fn quality_score(format: &RawFormat) -> f64 {
    format.filesize.unwrap_or(0.0) + format.fps.unwrap_or(0.0) * 1_000_000.0
}

fn usable_resolution(format: &RawFormat) -> Option<&str> {
    let has_video = format.vcodec.as_deref().is_some_and(|v| v != "none");
    let is_mp4 = format.ext.as_deref() == Some(CANONICAL_EXT);
    let resolution = format
        .resolution
        .as_deref()
        .filter(|r| !r.is_empty() && *r != "audio only")?;
    (has_video && is_mp4).then_some(resolution)
}

/// Keep the best mp4 video format per resolution, highest first, at most four.
pub fn select_quality_options(formats: &[RawFormat]) -> Vec<FormatOption> {
    let mut best: Vec<(&str, &RawFormat, f64)> = Vec::new();

    for format in formats {
        let Some(resolution) = usable_resolution(format) else {
            continue;
        };
        let score = quality_score(format);
        match best.iter_mut().find(|(r, _, _)| *r == resolution) {
            // strict comparison: the first of equal scores wins
            Some(entry) if score > entry.2 => *entry = (resolution, format, score),
            Some(_) => {}
            None => best.push((resolution, format, score)),
        }
    }

    best.sort_by(|a, b| match (parse_height(a.0), parse_height(b.0)) {
        (Some(ha), Some(hb)) => hb.cmp(&ha),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    best.into_iter()
        .take(MAX_QUALITY_OPTIONS)
        .map(|(resolution, format, score)| to_option(resolution, format, score))
        .collect()
}

fn to_option(resolution: &str, format: &RawFormat, score: f64) -> FormatOption {
    let fps = format.fps.filter(|f| *f > 0.0);
    let quality_label = match fps {
        Some(fps) => format!("{} ({}fps)", resolution, fps),
        None => resolution.to_string(),
    };
    let filesize = format.filesize.filter(|s| *s > 0.0).map(|s| s as u64);
    let filesize_mb = filesize.map(|s| (s as f64 / (1024.0 * 1024.0) * 10.0).round() / 10.0);
    let note = format!(
        "{} (audio will be merged automatically)",
        format.format_note.as_deref().unwrap_or("")
    )
    .trim()
    .to_string();

    FormatOption {
        format_id: format.format_id.clone(),
        quality_label,
        resolution: resolution.to_string(),
        fps,
        ext: format.ext.clone().unwrap_or_default(),
        filesize,
        filesize_mb,
        quality_score: score,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MediaError, MediaResult};
    use crate::source::{DownloadOutcome, DownloadRequest, SourceInfo};
    use async_trait::async_trait;

    const MB: f64 = 1024.0 * 1024.0;

    fn mp4(id: &str, resolution: &str, fps: f64, size_mb: f64) -> RawFormat {
        RawFormat {
            format_id: id.to_string(),
            ext: Some("mp4".to_string()),
            vcodec: Some("avc1.640028".to_string()),
            resolution: Some(resolution.to_string()),
            fps: Some(fps),
            filesize: Some(size_mb * MB),
            format_note: Some(resolution.split('x').nth(1).unwrap_or("").to_string() + "p"),
        }
    }

    #[test]
    fn test_higher_fps_wins_within_resolution() {
        let formats = vec![
            mp4("137", "1920x1080", 30.0, 50.0),
            mp4("299", "1920x1080", 60.0, 80.0),
        ];
        let options = select_quality_options(&formats);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].format_id, "299");
        assert_eq!(options[0].quality_label, "1920x1080 (60fps)");
        assert_eq!(options[0].filesize_mb, Some(80.0));
        assert_eq!(options[0].note, "1080p (audio will be merged automatically)");
    }

    #[test]
    fn test_filters_and_limits() {
        let mut audio = mp4("140", "audio only", 0.0, 3.0);
        audio.vcodec = Some("none".to_string());
        let mut webm = mp4("248", "1920x1080", 30.0, 90.0);
        webm.ext = Some("webm".to_string());

        let formats = vec![
            audio,
            webm,
            mp4("160", "256x144", 30.0, 1.0),
            mp4("134", "640x360", 30.0, 5.0),
            mp4("135", "854x480", 30.0, 8.0),
            mp4("136", "1280x720", 30.0, 20.0),
            mp4("137", "1920x1080", 30.0, 50.0),
        ];
        let options = select_quality_options(&formats);

        let ids: Vec<_> = options.iter().map(|o| o.format_id.as_str()).collect();
        assert_eq!(ids, vec!["137", "136", "135", "134"]);
        let heights: Vec<_> = options.iter().filter_map(|o| o.height()).collect();
        assert!(heights.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_first_wins_on_equal_score() {
        let formats = vec![
            mp4("a", "1280x720", 30.0, 10.0),
            mp4("b", "1280x720", 30.0, 10.0),
        ];
        assert_eq!(select_quality_options(&formats)[0].format_id, "a");
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        let mut format = mp4("x", "1280x720", 0.0, 0.0);
        format.fps = None;
        format.filesize = None;
        assert_eq!(quality_score(&format), 0.0);

        let options = select_quality_options(&[format]);
        assert_eq!(options[0].quality_label, "1280x720");
        assert_eq!(options[0].filesize_mb, None);
    }

    struct FailingSource;

    #[async_trait]
    impl MediaSource for FailingSource {
        async fn fetch_info(&self, _url: &str) -> MediaResult<SourceInfo> {
            Err(MediaError::download_failed("Video unavailable"))
        }

        async fn download(&self, _request: &DownloadRequest) -> MediaResult<DownloadOutcome> {
            unreachable!("format listing never downloads")
        }
    }

    #[tokio::test]
    async fn test_tool_failure_yields_empty_list() {
        let catalog = FormatCatalog::new(Arc::new(FailingSource), ToolPool::new(1));
        assert!(catalog.list_formats("https://example.com/v").await.is_empty());
    }
}
