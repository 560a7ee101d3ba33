use crate::domain::video::{VideoId, VideoRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Video metadata owner. In production this sits in front of a relational
/// store; the crate ships an in-memory adapter with the same contract.
///
/// Identifiers are allocated before insertion so the caller can lay files
/// out under the id first.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn allocate_id(&self) -> Result<VideoId, AppError>;

    async fn insert(&self, record: VideoRecord) -> Result<(), AppError>;

    async fn get(&self, id: VideoId) -> Result<Option<VideoRecord>, AppError>;

    /// All records, ordered by id.
    async fn list(&self) -> Result<Vec<VideoRecord>, AppError>;

    /// Remove and return a record, if present.
    async fn remove(&self, id: VideoId) -> Result<Option<VideoRecord>, AppError>;
}
