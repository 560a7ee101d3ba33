use crate::domain::jobs::{Job, JobReport, TranscodeJob};
use crate::domain::video::{NewVideo, VideoId, VideoRecord};
use crate::error::AppError;
use crate::hls::HlsLayout;
use crate::ports::catalog::Catalog;
use crate::ports::queue::JobQueue;
use crate::ports::repository::JobStatusRepository;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// A file the HTTP layer already wrote into the staging directory.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub path: PathBuf,
    /// Client-supplied filename; only the extension is ever used
    pub file_name: String,
}

/// Catalog-facing service. Creating a video is the one place a transcode
/// job enters the queue: an explicit call, exactly once per record, never a
/// side effect of some save hook.
pub struct VideoService {
    catalog: Arc<dyn Catalog>,
    queue: Arc<dyn JobQueue>,
    status: Arc<dyn JobStatusRepository>,
    layout: HlsLayout,
}

impl VideoService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        queue: Arc<dyn JobQueue>,
        status: Arc<dyn JobStatusRepository>,
        layout: HlsLayout,
    ) -> Self {
        Self {
            catalog,
            queue,
            status,
            layout,
        }
    }

    pub fn layout(&self) -> &HlsLayout {
        &self.layout
    }

    /// Register an uploaded video: move the staged files under the allocated
    /// id, insert the record and hand exactly one transcode job to the
    /// queue. Returns the record and the job id.
    pub async fn create_video(
        &self,
        new: NewVideo,
        source: StagedUpload,
        thumbnail: Option<StagedUpload>,
    ) -> Result<(VideoRecord, String), AppError> {
        let id = self.catalog.allocate_id().await?;

        let video_dir = self.layout.video_dir(id);
        fs::create_dir_all(&video_dir).await?;

        let source_path = self.layout.source_path(id);
        fs::rename(&source.path, &source_path).await?;

        let thumbnail_path = match thumbnail {
            Some(staged) => {
                let dest = video_dir.join(format!(
                    "thumbnail.{}",
                    sanitized_extension(&staged.file_name)
                ));
                fs::rename(&staged.path, &dest).await?;
                Some(dest)
            }
            None => None,
        };

        let record = VideoRecord {
            id,
            title: new.title,
            description: new.description,
            category: new.category,
            source_path: source_path.clone(),
            thumbnail_path,
            created_at: Utc::now(),
        };
        self.catalog.insert(record.clone()).await?;

        let job = TranscodeJob {
            id: Uuid::new_v4().to_string(),
            video_id: id,
            source_path,
        };
        self.status.save(JobReport::queued(&job)).await?;
        self.queue.enqueue(Job::ConvertToHls(job.clone())).await?;

        info!(video_id = id, job_id = %job.id, "video registered, transcode job enqueued");

        Ok((record, job.id))
    }

    pub async fn get_video(&self, id: VideoId) -> Result<VideoRecord, AppError> {
        self.catalog.get(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn list_videos(&self) -> Result<Vec<VideoRecord>, AppError> {
        self.catalog.list().await
    }

    /// Latest transcode report for a video. Unknown video and never-enqueued
    /// video both answer `NotFound`.
    pub async fn job_status(&self, id: VideoId) -> Result<JobReport, AppError> {
        self.get_video(id).await?;
        self.status
            .latest_for_video(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Remove the record together with the source file and every derived
    /// artifact under the video directory.
    pub async fn delete_video(&self, id: VideoId) -> Result<(), AppError> {
        self.catalog.remove(id).await?.ok_or(AppError::NotFound)?;

        let video_dir = self.layout.video_dir(id);
        if fs::metadata(&video_dir).await.is_ok() {
            fs::remove_dir_all(&video_dir).await?;
        }

        info!(video_id = id, "video and derived artifacts removed");
        Ok(())
    }
}

fn sanitized_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ext.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(8)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| String::from("jpg"))
}
