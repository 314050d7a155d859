//! Filesystem helpers: file naming, directory scans and cleanup.
//!
//! Every file the pipeline writes is prefixed with the sanitized job id
//! followed by `_`, so concurrent jobs sharing a directory never collide.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

use clipscene_models::LatestVideo;

use crate::error::MediaResult;

/// Longest sanitized clip title kept in a file name.
pub const MAX_TITLE_CHARS: usize = 80;

/// Extensions recognised as downloaded videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov", "m4v"];

/// Leftovers of interrupted yt-dlp downloads.
const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl"];

/// Keep ASCII alphanumerics, `-` and `_`.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// File-name-safe clip title, falling back to `clip-{index+1}`.
pub fn sanitize_title(title: &str, index: usize) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let capped: String = collapsed.chars().take(MAX_TITLE_CHARS).collect();

    if capped.is_empty() {
        format!("clip-{}", index + 1)
    } else {
        capped
    }
}

/// `{sanitized_id}_clip{NN}_{sanitized_title}.mp4`
pub fn clip_file_name(job_id: &str, index: usize, title: &str) -> String {
    format!(
        "{}_clip{:02}_{}.mp4",
        sanitize_id(job_id),
        index + 1,
        sanitize_title(title, index)
    )
}

/// Video title recovered from a downloaded file name.
pub fn title_from_path(path: &Path, sanitized_id: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let prefix = format!("{}_", sanitized_id);
    stem.strip_prefix(&prefix).unwrap_or(&stem).to_string()
}

fn is_partial(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PARTIAL_EXTENSIONS.contains(&e))
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// First file (by name) in `dir` starting with `{prefix}_`, ignoring partial downloads.
pub async fn find_prefixed_file(dir: &Path, prefix: &str) -> MediaResult<Option<PathBuf>> {
    let needle = format!("{}_", prefix);
    let mut entries = fs::read_dir(dir).await?;
    let mut matches = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        if name.starts_with(&needle) && !is_partial(&path) && entry.file_type().await?.is_file() {
            matches.push(path);
        }
    }

    matches.sort();
    Ok(matches.into_iter().next())
}

/// Most recently modified video file in `dir`.
pub async fn latest_video_file(dir: &Path) -> MediaResult<Option<LatestVideo>> {
    if !fs::try_exists(dir).await? {
        return Ok(None);
    }

    let mut entries = fs::read_dir(dir).await?;
    let mut newest: Option<(SystemTime, PathBuf, u64)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_video(&path) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map_or(true, |(t, _, _)| modified > *t) {
            newest = Some((modified, path, metadata.len()));
        }
    }

    Ok(newest.map(|(_, path, size)| {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let title = stem
            .split_once('_')
            .map(|(_, rest)| rest.to_string())
            .unwrap_or(stem);
        LatestVideo {
            filename,
            title,
            size,
            path: path.to_string_lossy().to_string(),
        }
    }))
}

/// Remove a file, treating "already gone" as success.
pub async fn remove_file_if_exists(path: &Path) -> MediaResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
