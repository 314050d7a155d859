//! Bounded pool of external tool invocations.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{MediaError, MediaResult};

/// Limits how many yt-dlp / ffmpeg / ffprobe processes run at once.
///
/// Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct ToolPool {
    semaphore: Arc<Semaphore>,
    max_processes: usize,
}

/// Held for the lifetime of one tool invocation.
#[derive(Debug)]
pub struct ToolPermit {
    _permit: OwnedSemaphorePermit,
}

impl ToolPool {
    pub fn new(max_processes: usize) -> Self {
        let max_processes = max_processes.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_processes)),
            max_processes,
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> MediaResult<ToolPermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| MediaError::ResourceLimit("Tool pool closed".to_string()))?;
        Ok(ToolPermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.max_processes
    }

    /// Number of tool processes currently running.
    pub fn in_use(&self) -> usize {
        self.max_processes - self.semaphore.available_permits()
    }
}

impl Default for ToolPool {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_permits_are_bounded() {
        let pool = ToolPool::new(1);
        let first = pool.acquire().await.unwrap();
        assert_eq!(pool.in_use(), 1);

        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err());

        drop(first);
        assert_eq!(pool.in_use(), 0);
        let _second = pool.acquire().await.unwrap();
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        assert_eq!(ToolPool::new(0).capacity(), 1);
    }
}
