use crate::domain::jobs::Job;
use crate::error::AppError;
use crate::ports::queue::JobQueue;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

/// In-process job queue over an unbounded channel.
///
/// `enqueue` never blocks the caller; workers share the receiver and take
/// turns pulling. Jobs for different videos have no ordering guarantee once
/// more than one worker is running. A Redis- or SQS-backed adapter can
/// replace this behind the same port when jobs must survive a restart.
pub struct ChannelQueue {
    tx: mpsc::UnboundedSender<Job>,
    rx: Mutex<mpsc::UnboundedReceiver<Job>>,
}

impl ChannelQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

impl Default for ChannelQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for ChannelQueue {
    async fn enqueue(&self, job: Job) -> Result<(), AppError> {
        self.tx
            .send(job)
            .map_err(|_| AppError::Queue("queue is closed".into()))
    }

    async fn dequeue(&self) -> Result<Option<Job>, AppError> {
        let mut rx = self.rx.lock().await;
        Ok(rx.recv().await)
    }
}
