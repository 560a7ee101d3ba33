use crate::domain::jobs::{
    Job, JobReport, JobState, RenditionOutcome, RenditionStatus, TranscodeJob,
};
use crate::domain::rendition::Rendition;
use crate::error::AppError;
use crate::hls::{HlsLayout, MediaPlaylist, PLAYLIST_NAME};
use crate::ports::encoder::EncoderRunner;
use crate::ports::queue::JobQueue;
use crate::ports::repository::JobStatusRepository;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Knobs for a single rendition encode.
#[derive(Debug, Clone)]
pub struct TranscodeOptions {
    /// Encoder invocations per rendition before giving up
    pub attempts: u32,
    /// Pause between attempts
    pub retry_backoff: Duration,
    /// Upper bound for one encoder invocation
    pub encode_timeout: Duration,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_backoff: Duration::from_secs(2),
            encode_timeout: Duration::from_secs(3600),
        }
    }
}

/// Converts one uploaded source into the full rendition set.
///
/// Renditions are independent: a failure is recorded in the job report and
/// the engine moves on, so a broken 1080p encode never takes the working
/// 480p/720p down with it. Each rendition is encoded into a temp directory
/// and renamed into place, which keeps readers away from half-written
/// manifests and makes re-runs plain overwrites.
pub struct TranscodeService {
    encoder: Arc<dyn EncoderRunner>,
    status: Arc<dyn JobStatusRepository>,
    layout: HlsLayout,
    options: TranscodeOptions,
}

impl TranscodeService {
    pub fn new(
        encoder: Arc<dyn EncoderRunner>,
        status: Arc<dyn JobStatusRepository>,
        layout: HlsLayout,
        options: TranscodeOptions,
    ) -> Self {
        Self {
            encoder,
            status,
            layout,
            options,
        }
    }

    /// Run the whole job. Encode failures end up in the job report, not in
    /// the return value; `Err` here means the bookkeeping itself broke.
    pub async fn convert_to_hls(&self, job: &TranscodeJob) -> Result<(), AppError> {
        let mut report = JobReport::queued(job);
        report.state = JobState::Running;
        report.updated_at = Utc::now();
        self.status.save(report.clone()).await?;

        if fs::metadata(&job.source_path).await.is_err() {
            error!(
                video_id = job.video_id,
                job_id = %job.id,
                path = %job.source_path.display(),
                "source file missing, job abandoned"
            );
            report.state = JobState::Failed;
            report.error = Some("source file is missing".into());
            report.updated_at = Utc::now();
            self.status.save(report).await?;
            return Ok(());
        }

        for rendition in Rendition::ALL {
            let outcome = self.encode_rendition(job, rendition).await;
            match &outcome.status {
                RenditionStatus::Ready => info!(
                    video_id = job.video_id,
                    rendition = %rendition,
                    attempts = outcome.attempts,
                    "rendition published"
                ),
                RenditionStatus::Failed { message } => error!(
                    video_id = job.video_id,
                    rendition = %rendition,
                    attempts = outcome.attempts,
                    %message,
                    "rendition failed"
                ),
            }
            report.renditions.push(outcome);
            report.updated_at = Utc::now();
            self.status.save(report.clone()).await?;
        }

        let ready = report.renditions.iter().filter(|o| o.is_ready()).count();
        report.state = if ready > 0 {
            JobState::Completed
        } else {
            JobState::Failed
        };
        if ready == 0 {
            report.error = Some("no rendition could be produced".into());
        }
        report.updated_at = Utc::now();
        self.status.save(report.clone()).await?;

        info!(
            video_id = job.video_id,
            job_id = %job.id,
            ready,
            total = report.renditions.len(),
            "transcode job finished"
        );
        Ok(())
    }

    async fn encode_rendition(&self, job: &TranscodeJob, rendition: Rendition) -> RenditionOutcome {
        let attempts = self.options.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.options.retry_backoff).await;
            }
            match self.try_encode(job, rendition).await {
                Ok(()) => {
                    return RenditionOutcome {
                        rendition,
                        attempts: attempt,
                        status: RenditionStatus::Ready,
                    }
                }
                Err(message) => {
                    warn!(
                        video_id = job.video_id,
                        rendition = %rendition,
                        attempt,
                        %message,
                        "encode attempt failed"
                    );
                    last_error = message;
                }
            }
        }

        RenditionOutcome {
            rendition,
            attempts,
            status: RenditionStatus::Failed {
                message: last_error,
            },
        }
    }

    async fn try_encode(&self, job: &TranscodeJob, rendition: Rendition) -> Result<(), String> {
        let work_dir = self.layout.rendition_tmp_dir(job.video_id, rendition);
        if fs::metadata(&work_dir).await.is_ok() {
            fs::remove_dir_all(&work_dir)
                .await
                .map_err(|e| format!("could not clear work dir: {e}"))?;
        }
        fs::create_dir_all(&work_dir)
            .await
            .map_err(|e| format!("could not create work dir: {e}"))?;

        let playlist_path = work_dir.join(PLAYLIST_NAME);
        let segment_pattern = work_dir.join(rendition.segment_pattern());

        let encode = self.encoder.run_hls_encode(
            &job.source_path,
            rendition,
            &playlist_path,
            &segment_pattern,
        );
        let output = match tokio::time::timeout(self.options.encode_timeout, encode).await {
            Err(_) => {
                return Err(format!(
                    "encoder timed out after {}s",
                    self.options.encode_timeout.as_secs()
                ))
            }
            Ok(Err(e)) => return Err(format!("encoder could not be started: {e}")),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(format!(
                "encoder exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            ));
        }

        self.verify_rendition(&work_dir).await?;

        let dest = self.layout.rendition_dir(job.video_id, rendition);
        if fs::metadata(&dest).await.is_ok() {
            fs::remove_dir_all(&dest)
                .await
                .map_err(|e| format!("could not clear previous rendition: {e}"))?;
        }
        fs::rename(&work_dir, &dest)
            .await
            .map_err(|e| format!("could not publish rendition: {e}"))
    }

    /// A rendition only publishes if its manifest parses and every segment
    /// it references is actually on disk.
    async fn verify_rendition(&self, dir: &Path) -> Result<(), String> {
        let manifest = fs::read_to_string(dir.join(PLAYLIST_NAME))
            .await
            .map_err(|e| format!("manifest unreadable: {e}"))?;
        let playlist =
            MediaPlaylist::parse(&manifest).map_err(|e| format!("manifest invalid: {e}"))?;

        if playlist.segments.is_empty() {
            return Err("manifest lists no segments".into());
        }
        for segment in &playlist.segments {
            if !self.layout.is_valid_segment_name(&segment.uri) {
                return Err(format!("manifest references unexpected uri {:?}", segment.uri));
            }
            if fs::metadata(dir.join(&segment.uri)).await.is_err() {
                return Err(format!(
                    "manifest references missing segment {:?}",
                    segment.uri
                ));
            }
        }
        Ok(())
    }
}

/// Worker pool pulling transcode jobs off the queue.
pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    service: Arc<TranscodeService>,
}

impl WorkerPool {
    pub fn new(queue: Arc<dyn JobQueue>, service: Arc<TranscodeService>) -> Self {
        Self { queue, service }
    }

    /// Spawn `workers` tasks and return their handles.
    pub fn start(&self, workers: usize) -> Vec<JoinHandle<()>> {
        (0..workers)
            .map(|id| {
                let queue = self.queue.clone();
                let service = self.service.clone();
                tokio::spawn(async move {
                    worker_loop(id, queue, service).await;
                })
            })
            .collect()
    }
}

async fn worker_loop(worker_id: usize, queue: Arc<dyn JobQueue>, service: Arc<TranscodeService>) {
    info!(worker_id, "worker started");

    loop {
        match queue.dequeue().await {
            Ok(Some(Job::ConvertToHls(job))) => {
                info!(
                    worker_id,
                    job_id = %job.id,
                    video_id = job.video_id,
                    "processing transcode job"
                );
                // Encode failures are recorded in the report; an error here
                // means the bookkeeping failed. Either way this worker keeps
                // going.
                if let Err(e) = service.convert_to_hls(&job).await {
                    error!(worker_id, job_id = %job.id, error = %e, "job processing failed");
                }
            }
            Ok(None) => {
                info!(worker_id, "queue closed, worker stopping");
                break;
            }
            Err(e) => {
                error!(worker_id, error = %e, "error pulling from queue");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    const TAIL: usize = 2048;
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let mut start = text.len().saturating_sub(TAIL);
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
