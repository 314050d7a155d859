//! FFprobe duration lookup.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a media file for its container duration in seconds.
pub async fn probe_duration(ffprobe: &Path, path: &Path) -> MediaResult<f64> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let binary = which::which(ffprobe)
        .map_err(|e| MediaError::FfprobeNotFound(format!("{}: {}", ffprobe.display(), e)))?;

    let output = Command::new(binary)
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_duration(&output.stdout)
}

/// Extract `format.duration` from ffprobe's JSON output.
fn parse_duration(stdout: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;
    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| MediaError::ffprobe_failed("Duration missing from ffprobe output", None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let json = br#"{"format": {"filename": "a.mp4", "duration": "90.023000"}}"#;
        let duration = parse_duration(json).unwrap();
        assert!((duration - 90.023).abs() < 1e-6);
    }

    #[test]
    fn test_parse_duration_missing() {
        let json = br#"{"format": {"filename": "a.mp4"}}"#;
        assert!(matches!(
            parse_duration(json),
            Err(MediaError::FfprobeFailed { .. })
        ));
        assert!(matches!(parse_duration(b"not json"), Err(MediaError::JsonParse(_))));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_duration(Path::new("ffprobe"), Path::new("/nonexistent/clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
