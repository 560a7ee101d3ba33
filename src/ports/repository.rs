use crate::domain::jobs::JobReport;
use crate::domain::video::VideoId;
use crate::error::AppError;
use async_trait::async_trait;

/// Store for per-job transcode status. Written by the orchestrator (queued)
/// and the workers (running/terminal), read by the status endpoint.
#[async_trait]
pub trait JobStatusRepository: Send + Sync {
    /// Insert or replace the report for `report.job_id`.
    async fn save(&self, report: JobReport) -> Result<(), AppError>;

    async fn get(&self, job_id: &str) -> Result<Option<JobReport>, AppError>;

    /// Report of the most recently enqueued job for a video.
    async fn latest_for_video(&self, video_id: VideoId) -> Result<Option<JobReport>, AppError>;
}
