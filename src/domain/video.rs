use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stable integer identifier. Artifacts are addressed by this id, never by
/// the source filename, so the id must not change once a transcode job has
/// been enqueued.
pub type VideoId = i64;

/// Catalog record for one uploaded video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Uploaded MP4 on the file store
    pub source_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

/// Metadata supplied by the uploader; the catalog fills in the rest.
#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub category: String,
}
