//! Pipeline integration tests against in-process tool fakes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use clipscene_media::{
    DownloadOutcome, DownloadRequest, FfmpegCommand, MediaError, MediaResult, MediaSource,
    RawFormat, SourceInfo, Transcoder,
};
use clipscene_models::{
    ClipSpec, JobKind, JobStatus, Timestamp, VideoId, VideoRecord, VideoStatus,
};
use clipscene_worker::{JobStore, Orchestrator, PipelineError, WorkerConfig};

/// Writes a 4 KiB "video" wherever the output template points.
struct FakeSource {
    title: String,
    fail_downloads: bool,
    /// Deliver a directory, which the pipeline cannot remove as a file
    deliver_directory: bool,
    formats: Vec<RawFormat>,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            title: "Test Video".to_string(),
            fail_downloads: false,
            deliver_directory: false,
            formats: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail_downloads: true,
            ..Self::new()
        }
    }

    fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn fetch_info(&self, _url: &str) -> MediaResult<SourceInfo> {
        Ok(SourceInfo {
            title: Some(self.title.clone()),
            formats: self.formats.clone(),
        })
    }

    async fn download(&self, request: &DownloadRequest) -> MediaResult<DownloadOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_downloads {
            return Err(MediaError::download_failed("ERROR: Video unavailable"));
        }
        let path = PathBuf::from(
            request
                .output_template
                .replace("%(title)s", &self.title)
                .replace("%(ext)s", "mp4"),
        );
        if self.deliver_directory {
            tokio::fs::create_dir_all(&path).await?;
        } else {
            tokio::fs::write(&path, vec![0u8; 4096]).await?;
        }
        Ok(DownloadOutcome {
            reported_path: Some(path),
        })
    }
}

/// Probes every file as `duration` seconds and writes 2 KiB clips.
///
/// When `observe` is set, records the job's progress at each extraction.
struct FakeTranscoder {
    duration: f64,
    runs: Mutex<Vec<PathBuf>>,
    observe: Mutex<Option<(JobStore, String)>>,
    progress_seen: Mutex<Vec<Option<u8>>>,
}

impl FakeTranscoder {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            runs: Mutex::new(Vec::new()),
            observe: Mutex::new(None),
            progress_seen: Mutex::new(Vec::new()),
        }
    }

    fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn probe_duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(self.duration)
    }

    async fn run(&self, command: &FfmpegCommand, _timeout: Duration) -> MediaResult<()> {
        let observed = self.observe.lock().unwrap().clone();
        if let Some((store, id)) = observed {
            let progress = store.get_job(&id).await.and_then(|j| j.progress);
            self.progress_seen.lock().unwrap().push(progress);
        }
        self.runs.lock().unwrap().push(command.output().to_path_buf());
        tokio::fs::write(command.output(), vec![1u8; 2048]).await?;
        Ok(())
    }
}

struct Harness {
    dir: TempDir,
    store: JobStore,
    source: Arc<FakeSource>,
    transcoder: Arc<FakeTranscoder>,
    orchestrator: Orchestrator,
}

impl Harness {
    async fn new(source: FakeSource) -> Self {
        let dir = TempDir::new().unwrap();
        let config = WorkerConfig::with_base_dir(dir.path());
        config.ensure_dirs().await.unwrap();

        let store = JobStore::new();
        let source = Arc::new(source);
        let transcoder = Arc::new(FakeTranscoder::new(90.0));
        let orchestrator =
            Orchestrator::new(config, store.clone(), source.clone(), transcoder.clone());

        Self {
            dir,
            store,
            source,
            transcoder,
            orchestrator,
        }
    }

    fn downloads(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }

    fn clips(&self) -> PathBuf {
        self.dir.path().join("clips")
    }
}

fn clip(title: Option<&str>, start: &str, end: &str) -> ClipSpec {
    ClipSpec::new(
        title,
        Timestamp::parse(start).unwrap(),
        Timestamp::parse(end).unwrap(),
    )
}

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

// ============================================================================
// Unified pipeline
// ============================================================================

#[tokio::test]
async fn test_unified_creates_all_clips_and_removes_source() {
    let h = Harness::new(FakeSource::new()).await;

    let submission = h
        .orchestrator
        .submit_unified(
            URL,
            vec![
                clip(Some("Intro"), "00:00:00", "00:00:10"),
                clip(None, "00:00:30", "00:00:45"),
            ],
        )
        .await
        .unwrap();
    submission.task.await.unwrap();

    let job = h.orchestrator.get_job(&submission.id).await.unwrap();
    assert_eq!(job.kind, JobKind::Unified);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, Some(100));
    assert_eq!(job.current_step, "Created 2 clips");
    assert_eq!(job.completed_clips, 2);
    assert_eq!(job.video_id.as_deref(), Some(submission.id.as_str()));
    assert!(job.error.is_none());

    assert_eq!(job.clips[0].title, "Intro");
    assert_eq!(job.clips[1].title, "Clip 2");
    assert_eq!(job.clips[1].index, 1);
    for result in &job.clips {
        assert!(Path::new(&result.file_path).exists());
        assert!(result.file_size >= 1024);
        assert!(result.file_path.starts_with(h.clips().to_string_lossy().as_ref()));
    }

    let leftover: Vec<_> = std::fs::read_dir(h.downloads()).unwrap().collect();
    assert!(leftover.is_empty(), "source video should be removed");

    // the job id never resolves to a download record
    assert!(matches!(
        h.orchestrator.get_video(&submission.id).await,
        Err(PipelineError::NotFound(_))
    ));
    assert!(h.orchestrator.list_completed_videos().await.is_empty());

    let request = &h.source.requests()[0];
    assert!(request.format.starts_with("bestvideo[height<=2160]+bestaudio/"));
    assert_eq!(request.merge_output_format.as_deref(), Some("mp4"));
}

#[tokio::test]
async fn test_unified_halts_on_invalid_second_clip() {
    let h = Harness::new(FakeSource::new()).await;

    let submission = h
        .orchestrator
        .submit_unified(
            URL,
            vec![
                clip(None, "00:00:10", "00:00:20"),
                clip(None, "00:01:00", "00:00:50"),
            ],
        )
        .await
        .unwrap();
    submission.task.await.unwrap();

    let job = h.orchestrator.get_job(&submission.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.clips.len(), 1);
    assert_eq!(job.completed_clips, 1);

    let error = job.error.unwrap();
    assert!(error.starts_with("Clip 2 failed:"), "{}", error);
    assert!(error.contains("00:01:00") && error.contains("00:00:50"), "{}", error);
    assert_eq!(h.transcoder.run_count(), 1);
}

#[tokio::test]
async fn test_unified_rejects_clip_past_duration() {
    let h = Harness::new(FakeSource::new()).await;

    let submission = h
        .orchestrator
        .submit_unified(URL, vec![clip(None, "00:01:20", "00:01:40")])
        .await
        .unwrap();
    submission.task.await.unwrap();

    let job = h.orchestrator.get_job(&submission.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.clips.is_empty());
    let error = job.error.unwrap();
    assert!(error.contains("00:01:40") && error.contains("90"), "{}", error);
    assert_eq!(h.transcoder.run_count(), 0);
}

#[tokio::test]
async fn test_unified_acquisition_failure() {
    let h = Harness::new(FakeSource::failing()).await;

    let submission = h
        .orchestrator
        .submit_unified(URL, vec![clip(None, "00:00:00", "00:00:05")])
        .await
        .unwrap();
    submission.task.await.unwrap();

    let job = h.orchestrator.get_job(&submission.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.clips.is_empty());
    assert!(job.video_id.is_none());

    let error = job.error.unwrap();
    assert!(error.starts_with("Failed to download video:"), "{}", error);
    assert!(error.contains("primary") && error.contains("lowest"), "{}", error);

    assert_eq!(h.source.requests().len(), 3);
    assert_eq!(h.transcoder.run_count(), 0);
}

#[tokio::test]
async fn test_unified_progress_per_clip() {
    let h = Harness::new(FakeSource::new()).await;

    let submission = h
        .orchestrator
        .submit_unified(
            URL,
            vec![
                clip(None, "00:00:00", "00:00:05"),
                clip(None, "00:00:05", "00:00:10"),
            ],
        )
        .await
        .unwrap();
    // the task cannot run before this test yields on a current-thread runtime
    *h.transcoder.observe.lock().unwrap() = Some((h.store.clone(), submission.id.clone()));
    submission.task.await.unwrap();

    let seen = h.transcoder.progress_seen.lock().unwrap().clone();
    assert_eq!(seen, vec![Some(40), Some(65)]);
}

#[tokio::test]
async fn test_unified_source_cleanup_failure_is_only_a_warning() {
    let source = FakeSource {
        deliver_directory: true,
        ..FakeSource::new()
    };
    let h = Harness::new(source).await;

    let submission = h
        .orchestrator
        .submit_unified(URL, vec![clip(None, "00:00:00", "00:00:05")])
        .await
        .unwrap();
    submission.task.await.unwrap();

    let job = h.orchestrator.get_job(&submission.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, Some(100));
    assert_eq!(job.clips.len(), 1);
    assert!(job.error.is_none());
    assert!(
        job.current_step
            .starts_with("Created 1 clips. Warning: could not remove source file:"),
        "{}",
        job.current_step
    );
}

#[tokio::test]
async fn test_unified_validation() {
    let h = Harness::new(FakeSource::new()).await;

    let err = h
        .orchestrator
        .submit_unified("", vec![clip(None, "0", "5")])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    let err = h.orchestrator.submit_unified(URL, vec![]).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    assert!(h.store.is_empty().await);
}

// ============================================================================
// Legacy two-phase pipeline
// ============================================================================

#[tokio::test]
async fn test_acquisition_then_clipping_continues_past_failures() {
    let h = Harness::new(FakeSource::new()).await;

    let download = h
        .orchestrator
        .submit_acquisition(URL, Some("137".to_string()))
        .await
        .unwrap();
    download.task.await.unwrap();

    let video = h.orchestrator.get_video(&download.id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Completed);
    assert_eq!(video.current_step, "Download completed!");
    assert_eq!(video.title.as_deref(), Some("Test Video"));
    assert_eq!(video.file_size, Some(4096));
    assert_eq!(h.source.requests()[0].format, "137+bestaudio");

    let listed = h.orchestrator.list_completed_videos().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].video_id, download.id);

    let clipping = h
        .orchestrator
        .submit_clipping(
            Some(&download.id),
            vec![
                clip(Some("Good"), "00:00:10", "00:00:20"),
                clip(Some("Backwards"), "00:00:30", "00:00:20"),
                clip(Some("Also good"), "00:00:40", "00:00:50"),
            ],
        )
        .await
        .unwrap();
    clipping.task.await.unwrap();

    let job = h.orchestrator.get_job(&clipping.id).await.unwrap();
    assert_eq!(job.kind, JobKind::Clipping);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.current_step, "Created 2 of 3 clips (1 failed)");
    assert_eq!(job.progress, Some(100));
    let indices: Vec<_> = job.clips.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(job.video_id.as_deref(), Some(download.id.as_str()));

    // legacy clipping keeps its source
    assert!(Path::new(video.file_path.as_deref().unwrap()).exists());
}

#[tokio::test]
async fn test_acquisition_failure_marks_video_error() {
    let h = Harness::new(FakeSource::failing()).await;

    let download = h.orchestrator.submit_acquisition(URL, None).await.unwrap();
    download.task.await.unwrap();

    let video = h.orchestrator.get_video(&download.id).await.unwrap();
    assert_eq!(video.status, VideoStatus::Error);
    assert!(video.error.unwrap().contains("Video unavailable"));
    assert!(h.orchestrator.list_completed_videos().await.is_empty());
}

#[tokio::test]
async fn test_clipping_rejects_unknown_or_unready_video() {
    let h = Harness::new(FakeSource::new()).await;

    let err = h
        .orchestrator
        .submit_clipping(Some("missing"), vec![clip(None, "0", "5")])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));

    let pending = VideoRecord::new(VideoId::from_string("pending"), URL, None);
    h.store.insert_video(pending).await;
    let err = h
        .orchestrator
        .submit_clipping(Some("pending"), vec![clip(None, "0", "5")])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[tokio::test]
async fn test_clipping_rejects_video_whose_file_is_gone() {
    let h = Harness::new(FakeSource::new()).await;

    let download = h.orchestrator.submit_acquisition(URL, None).await.unwrap();
    download.task.await.unwrap();
    let video = h.orchestrator.get_video(&download.id).await.unwrap();
    std::fs::remove_file(video.file_path.as_deref().unwrap()).unwrap();

    let err = h
        .orchestrator
        .submit_clipping(Some(&download.id), vec![clip(None, "0", "5")])
        .await
        .unwrap_err();
    match err {
        PipelineError::NotFound(message) => assert_eq!(message, "Video file not found"),
        other => panic!("expected NotFound, got {:?}", other),
    }

    let err = h
        .orchestrator
        .preview_clips(Some(&download.id), &[clip(None, "0", "5")])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));

    // only the download record exists; no clipping job was registered
    assert_eq!(h.store.len().await, 1);
    assert_eq!(h.transcoder.run_count(), 0);
}

#[tokio::test]
async fn test_clipping_latest_video() {
    let h = Harness::new(FakeSource::new()).await;

    let err = h
        .orchestrator
        .submit_clipping(None, vec![clip(None, "0", "5")])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));

    let source = h.downloads().join("abc_Manual Upload.mp4");
    std::fs::write(&source, vec![0u8; 4096]).unwrap();

    let latest = h.orchestrator.latest_video().await.unwrap();
    assert_eq!(latest.title, "Manual Upload");

    let clipping = h
        .orchestrator
        .submit_clipping(None, vec![clip(None, "0", "5")])
        .await
        .unwrap();
    clipping.task.await.unwrap();

    let job = h.orchestrator.get_job(&clipping.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.current_step, "Created 1 of 1 clips");
    assert_eq!(job.video_id.as_deref(), Some("latest"));
    assert!(source.exists());
}

// ============================================================================
// Supporting operations
// ============================================================================

#[tokio::test]
async fn test_preview_clips() {
    let h = Harness::new(FakeSource::new()).await;
    std::fs::write(h.downloads().join("abc_Talk.mp4"), vec![0u8; 4096]).unwrap();

    let preview = h
        .orchestrator
        .preview_clips(
            None,
            &[
                clip(Some("Q&A"), "00:10:00", "00:12:30"),
                clip(None, "00:05:00", "00:04:00"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(preview.video_id, "latest");
    assert_eq!(preview.video.title, "Talk");
    assert_eq!(preview.clips[0].duration, "00:02:30");
    assert_eq!(preview.clips[1].title, "Clip 2");
    assert_eq!(preview.clips[1].duration, "00:00:00");
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_create_archive() {
    let h = Harness::new(FakeSource::new()).await;

    let err = h.orchestrator.create_archive("nope").await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound(_)));

    let submission = h
        .orchestrator
        .submit_unified(
            URL,
            vec![
                clip(Some("One"), "0", "5"),
                clip(Some("Two"), "5", "10"),
            ],
        )
        .await
        .unwrap();
    submission.task.await.unwrap();

    let path = h.orchestrator.create_archive(&submission.id).await.unwrap();
    assert_eq!(
        path,
        h.clips().join(format!("clips_{}.zip", submission.id))
    );
    let archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.file_names().any(|n| n.ends_with("_One.mp4")));
}

#[tokio::test]
async fn test_create_archive_requires_completed_job() {
    let h = Harness::new(FakeSource::failing()).await;

    let submission = h
        .orchestrator
        .submit_unified(URL, vec![clip(None, "0", "5")])
        .await
        .unwrap();
    submission.task.await.unwrap();

    let err = h.orchestrator.create_archive(&submission.id).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[tokio::test]
async fn test_list_formats() {
    let mut source = FakeSource::new();
    source.formats = vec![
        RawFormat {
            format_id: "137".into(),
            ext: Some("mp4".into()),
            vcodec: Some("avc1".into()),
            resolution: Some("1920x1080".into()),
            fps: Some(30.0),
            filesize: Some(50.0 * 1024.0 * 1024.0),
            format_note: Some("1080p".into()),
        },
        RawFormat {
            format_id: "299".into(),
            ext: Some("mp4".into()),
            vcodec: Some("avc1".into()),
            resolution: Some("1920x1080".into()),
            fps: Some(60.0),
            filesize: Some(80.0 * 1024.0 * 1024.0),
            format_note: Some("1080p60".into()),
        },
    ];
    let h = Harness::new(source).await;

    let formats = h.orchestrator.list_formats(URL).await.unwrap();
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0].format_id, "299");

    let err = h.orchestrator.list_formats(" ").await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}
