//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use clipscene_models::EncodingConfig;

use crate::error::{last_stderr_line, MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Limit output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Shift timestamps so the output starts at zero.
    pub fn avoid_negative_ts(self, mode: impl Into<String>) -> Self {
        self.output_arg("-avoid_negative_ts").output_arg(mode)
    }

    /// Apply a full encoding profile.
    pub fn encoding(self, encoding: &EncodingConfig) -> Self {
        self.video_codec(&encoding.codec)
            .audio_codec(&encoding.audio_codec)
            .preset(&encoding.preset)
            .crf(encoding.crf)
            .avoid_negative_ts(&encoding.avoid_negative_ts)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with a wall-clock timeout.
pub struct FfmpegRunner {
    /// FFmpeg executable
    binary: PathBuf,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegRunner {
    /// Create a new runner for the given executable.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    /// Run an FFmpeg command. Failures carry the process's stderr.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let binary = which::which(&self.binary)
            .map_err(|e| MediaError::FfmpegNotFound(format!("{}: {}", self.binary.display(), e)))?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", binary.display(), args.join(" "));

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let result = self.wait_for_completion(&mut child).await;

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        match result? {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(MediaError::ffmpeg_failed(
                format!(
                    "exited with status {}: {}",
                    status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    last_stderr_line(&stderr)
                ),
                Some(stderr),
                status.code(),
            )),
            None => Err(MediaError::timed_out(self.timeout_secs.unwrap_or_default(), stderr)),
        }
    }

    /// Wait for the child process. `None` means it was killed at the timeout.
    async fn wait_for_completion(
        &self,
        child: &mut Child,
    ) -> MediaResult<Option<std::process::ExitStatus>> {
        let Some(timeout_secs) = self.timeout_secs else {
            return Ok(Some(child.wait().await?));
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
            Ok(status) => Ok(Some(status?)),
            Err(_) => {
                warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                let _ = child.kill().await;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .seek(10.0)
            .duration(30.0)
            .video_codec("libx264")
            .crf(18);

        let args = cmd.build_args();
        assert!(args.contains(&"-ss".to_string()));
        assert!(args.contains(&"10.000".to_string()));
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"libx264".to_string()));
    }

    #[test]
    fn test_clip_argument_order() {
        let cmd = FfmpegCommand::new("src.mp4", "out.mp4")
            .seek(10.0)
            .duration(10.0)
            .encoding(&EncodingConfig::default());

        let args = cmd.build_args();
        assert_eq!(
            args,
            vec![
                "-y", "-v", "error", "-ss", "10.000", "-i", "src.mp4", "-t", "10.000", "-c:v",
                "libx264", "-c:a", "aac", "-preset", "fast", "-crf", "23",
                "-avoid_negative_ts", "make_zero", "out.mp4",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let runner = FfmpegRunner::new("definitely-not-a-real-ffmpeg-binary");
        let cmd = FfmpegCommand::new("a.mp4", "b.mp4");
        let err = runner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound(_)));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process_and_keeps_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), "echo 'partial output' >&2\nexec sleep 30");
        let runner = FfmpegRunner::new(tool).with_timeout(Duration::from_secs(1));

        let started = std::time::Instant::now();
        let err = runner
            .run(&FfmpegCommand::new("a.mp4", "b.mp4"))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            MediaError::Timeout { secs, stderr, .. } => {
                assert_eq!(secs, 1);
                assert!(stderr.unwrap().contains("partial output"));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), "echo 'Invalid argument here' >&2\nexit 3");
        let runner = FfmpegRunner::new(tool).with_timeout(Duration::from_secs(5));

        let err = runner
            .run(&FfmpegCommand::new("a.mp4", "b.mp4"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "FFmpeg command failed: exited with status 3: Invalid argument here"
        );
        assert!(matches!(err, MediaError::FfmpegFailed { exit_code: Some(3), .. }));
    }
}
