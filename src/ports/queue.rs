use crate::domain::jobs::Job;
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Hand a job to the queue. Returns as soon as the job is accepted;
    /// execution happens later on a worker.
    async fn enqueue(&self, job: Job) -> Result<(), AppError>;

    /// Block until a job is available. `None` means the queue has shut
    /// down and the caller should stop.
    async fn dequeue(&self) -> Result<Option<Job>, AppError>;
}
