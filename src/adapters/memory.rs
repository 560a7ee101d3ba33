//! In-memory catalog and job-status stores.
//!
//! These back the monolith binary and the test suite. Both are safe for
//! concurrent use from the HTTP pool and the worker pool.

use crate::domain::jobs::JobReport;
use crate::domain::video::{VideoId, VideoRecord};
use crate::error::AppError;
use crate::ports::catalog::Catalog;
use crate::ports::repository::JobStatusRepository;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

pub struct InMemoryCatalog {
    next_id: AtomicI64,
    videos: RwLock<BTreeMap<VideoId, VideoRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            videos: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn allocate_id(&self) -> Result<VideoId, AppError> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn insert(&self, record: VideoRecord) -> Result<(), AppError> {
        self.videos.write().await.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: VideoId) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<VideoRecord>, AppError> {
        Ok(self.videos.read().await.values().cloned().collect())
    }

    async fn remove(&self, id: VideoId) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.videos.write().await.remove(&id))
    }
}

#[derive(Default)]
struct StatusInner {
    reports: HashMap<String, JobReport>,
    latest_by_video: HashMap<VideoId, String>,
}

pub struct InMemoryJobStatus {
    inner: RwLock<StatusInner>,
}

impl InMemoryJobStatus {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StatusInner::default()),
        }
    }
}

impl Default for InMemoryJobStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStatusRepository for InMemoryJobStatus {
    async fn save(&self, report: JobReport) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner
            .latest_by_video
            .insert(report.video_id, report.job_id.clone());
        inner.reports.insert(report.job_id.clone(), report);
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobReport>, AppError> {
        Ok(self.inner.read().await.reports.get(job_id).cloned())
    }

    async fn latest_for_video(&self, video_id: VideoId) -> Result<Option<JobReport>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .latest_by_video
            .get(&video_id)
            .and_then(|job_id| inner.reports.get(job_id))
            .cloned())
    }
}
