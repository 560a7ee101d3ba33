use crate::domain::rendition::Rendition;
use crate::domain::video::VideoId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A unit of deferred transcoding work. Ownership passes to the job queue
/// the moment it is enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    /// Unique job ID
    pub id: String,
    /// Owning video - report lookups are keyed by this
    pub video_id: VideoId,
    /// Path to the uploaded source file
    pub source_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Job {
    ConvertToHls(TranscodeJob),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Result of encoding one rendition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenditionStatus {
    Ready,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenditionOutcome {
    pub rendition: Rendition,
    /// How many encoder invocations this rendition took
    pub attempts: u32,
    #[serde(flatten)]
    pub status: RenditionStatus,
}

impl RenditionOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self.status, RenditionStatus::Ready)
    }
}

/// Per-job status record, updated as the job moves through the worker.
/// A job completes as long as at least one rendition was produced; the
/// per-rendition outcomes carry the detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub video_id: VideoId,
    pub state: JobState,
    pub renditions: Vec<RenditionOutcome>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobReport {
    pub fn queued(job: &TranscodeJob) -> Self {
        Self {
            job_id: job.id.clone(),
            video_id: job.video_id,
            state: JobState::Queued,
            renditions: Vec::new(),
            error: None,
            updated_at: Utc::now(),
        }
    }
}
