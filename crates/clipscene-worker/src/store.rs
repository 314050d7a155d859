//! Volatile, insertion-ordered registry of video and job records.
//!
//! Readers always get cloned snapshots taken under the read lock. Each record
//! has exactly one writer: the [`JobWriter`] or [`VideoWriter`] handed out
//! when it was inserted, owned by the background task processing it.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use clipscene_models::{JobRecord, ProcessingJob, VideoRecord, VideoSummary};

#[derive(Debug, Default)]
struct StoreInner {
    order: Vec<String>,
    records: HashMap<String, JobRecord>,
}

impl StoreInner {
    fn insert(&mut self, record: JobRecord) {
        let id = record.id().to_string();
        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    fn remove(&mut self, id: &str) -> Option<JobRecord> {
        let removed = self.records.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }
}

/// Shared job store. Cloning is cheap and shares state.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a video record and return its writer.
    pub async fn insert_video(&self, video: VideoRecord) -> VideoWriter {
        let id = video.id.as_str().to_string();
        self.inner.write().await.insert(JobRecord::Video(video));
        VideoWriter {
            store: self.clone(),
            id,
        }
    }

    /// Register a processing job and return its writer.
    pub async fn insert_job(&self, job: ProcessingJob) -> JobWriter {
        let id = job.id.as_str().to_string();
        self.inner.write().await.insert(JobRecord::Processing(job));
        JobWriter {
            store: self.clone(),
            id,
        }
    }

    pub async fn get(&self, id: &str) -> Option<JobRecord> {
        self.inner.read().await.records.get(id).cloned()
    }

    pub async fn get_video(&self, id: &str) -> Option<VideoRecord> {
        self.inner
            .read()
            .await
            .records
            .get(id)
            .and_then(JobRecord::as_video)
            .cloned()
    }

    pub async fn get_job(&self, id: &str) -> Option<ProcessingJob> {
        self.inner
            .read()
            .await
            .records
            .get(id)
            .and_then(JobRecord::as_job)
            .cloned()
    }

    /// Completed videos in insertion order.
    pub async fn list_completed_videos(&self) -> Vec<VideoSummary> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter_map(JobRecord::as_video)
            .filter_map(VideoRecord::summary)
            .collect()
    }

    /// Apply `f` to a video record under the write lock.
    ///
    /// Returns `false` when no video record has this id.
    pub async fn update_video<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut VideoRecord),
    {
        match self.inner.write().await.records.get_mut(id) {
            Some(JobRecord::Video(video)) => {
                f(video);
                true
            }
            _ => false,
        }
    }

    /// Apply `f` to a processing job under the write lock.
    ///
    /// Returns `false` when no processing job has this id.
    pub async fn update_job<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut ProcessingJob),
    {
        match self.inner.write().await.records.get_mut(id) {
            Some(JobRecord::Processing(job)) => {
                f(job);
                true
            }
            _ => false,
        }
    }

    /// Remove a video record. Processing jobs are never removed.
    pub async fn remove_video(&self, id: &str) -> Option<VideoRecord> {
        let mut inner = self.inner.write().await;
        if !matches!(inner.records.get(id), Some(JobRecord::Video(_))) {
            return None;
        }
        match inner.remove(id) {
            Some(JobRecord::Video(video)) => Some(video),
            _ => None,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

/// Sole writer of one processing job.
#[derive(Debug)]
pub struct JobWriter {
    store: JobStore,
    id: String,
}

impl JobWriter {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ProcessingJob),
    {
        self.store.update_job(&self.id, f).await;
    }

    pub async fn snapshot(&self) -> Option<ProcessingJob> {
        self.store.get_job(&self.id).await
    }
}

/// Sole writer of one video record.
#[derive(Debug)]
pub struct VideoWriter {
    store: JobStore,
    id: String,
}

impl VideoWriter {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut VideoRecord),
    {
        self.store.update_video(&self.id, f).await;
    }

    pub async fn snapshot(&self) -> Option<VideoRecord> {
        self.store.get_video(&self.id).await
    }
}
