//! End-to-end pipeline scenarios: upload, transcode, playback.
//!
//! The encoder is a scripted double that produces real manifests and
//! segments (or fails selected renditions), so everything downstream of the
//! process boundary runs for real: layout, verification, publication and
//! the HTTP serving contract.

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use kino::adapters::{ChannelQueue, InMemoryCatalog, InMemoryJobStatus, StaticTokenAuth};
use kino::application::orchestrator::{StagedUpload, VideoService};
use kino::application::worker::{TranscodeOptions, TranscodeService};
use kino::domain::jobs::{Job, JobState, RenditionStatus, TranscodeJob};
use kino::domain::rendition::Rendition;
use kino::domain::video::{NewVideo, VideoId, VideoRecord};
use kino::error::AppError;
use kino::hls::{HlsLayout, MediaPlaylist, PLAYLIST_NAME};
use kino::http::{playback, AppState};
use kino::ports::catalog::Catalog;
use kino::ports::encoder::EncoderRunner;
use kino::ports::queue::JobQueue;
use kino::ports::repository::JobStatusRepository;
use std::collections::HashSet;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TOKEN: &str = "integration-token";

/// Behaves like a happy ffmpeg for most renditions: writes a manifest plus
/// the segments it references. Renditions in `fail` exit non-zero instead.
struct ScriptedEncoder {
    fail: HashSet<Rendition>,
}

impl ScriptedEncoder {
    fn ok() -> Self {
        Self {
            fail: HashSet::new(),
        }
    }

    fn failing(rendition: Rendition) -> Self {
        Self {
            fail: HashSet::from([rendition]),
        }
    }
}

#[async_trait]
impl EncoderRunner for ScriptedEncoder {
    async fn run_hls_encode(
        &self,
        _source: &Path,
        rendition: Rendition,
        playlist_path: &Path,
        segment_pattern: &Path,
    ) -> io::Result<Output> {
        if self.fail.contains(&rendition) {
            return Ok(Output {
                status: ExitStatus::from_raw(1 << 8),
                stdout: Vec::new(),
                stderr: b"Conversion failed: invalid frame".to_vec(),
            });
        }

        let dir = playlist_path.parent().expect("playlist has a parent");
        let pattern = segment_pattern
            .file_name()
            .and_then(|n| n.to_str())
            .expect("segment pattern");

        let mut manifest = String::from(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:0\n",
        );
        for i in 0..3 {
            let name = pattern.replace("%d", &i.to_string());
            std::fs::write(dir.join(&name), format!("{rendition} segment {i}"))?;
            manifest.push_str(&format!("#EXTINF:10.000000,\n{name}\n"));
        }
        manifest.push_str("#EXT-X-ENDLIST\n");
        std::fs::write(playlist_path, manifest)?;

        Ok(Output {
            status: ExitStatus::from_raw(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

struct Harness {
    state: AppState,
    service: Arc<VideoService>,
    queue: Arc<ChannelQueue>,
    transcoder: TranscodeService,
    status: Arc<InMemoryJobStatus>,
    layout: HlsLayout,
    _root: TempDir,
}

fn harness(encoder: Arc<dyn EncoderRunner>) -> Harness {
    let root = TempDir::new().unwrap();
    let layout = HlsLayout::new(root.path());
    let catalog = Arc::new(InMemoryCatalog::new());
    let status = Arc::new(InMemoryJobStatus::new());
    let queue = Arc::new(ChannelQueue::new());

    let service = Arc::new(VideoService::new(
        catalog,
        queue.clone(),
        status.clone(),
        layout.clone(),
    ));
    let transcoder = TranscodeService::new(
        encoder,
        status.clone(),
        layout.clone(),
        TranscodeOptions {
            attempts: 1,
            retry_backoff: Duration::ZERO,
            encode_timeout: Duration::from_secs(5),
        },
    );
    let state = AppState {
        service: service.clone(),
        auth: Arc::new(StaticTokenAuth::new(TOKEN)),
    };

    Harness {
        state,
        service,
        queue,
        transcoder,
        status,
        layout,
        _root: root,
    }
}

fn auth_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {TOKEN}")).unwrap(),
    );
    headers
}

async fn upload_movie(h: &Harness) -> (VideoRecord, String) {
    let staging = h.layout.staging_dir();
    tokio::fs::create_dir_all(&staging).await.unwrap();
    let staged = staging.join("pending-upload");
    tokio::fs::write(&staged, b"raw mp4 bytes").await.unwrap();

    h.service
        .create_video(
            NewVideo {
                title: "Big Buck Rust".into(),
                description: "integration fixture".into(),
                category: "demo".into(),
            },
            StagedUpload {
                path: staged,
                file_name: "movie.mp4".into(),
            },
            None,
        )
        .await
        .unwrap()
}

async fn run_pending_job(h: &Harness) -> TranscodeJob {
    let Some(Job::ConvertToHls(job)) = h.queue.dequeue().await.unwrap() else {
        panic!("expected a queued transcode job");
    };
    h.transcoder.convert_to_hls(&job).await.unwrap();
    job
}

async fn response_parts(result: Result<Response, AppError>) -> (StatusCode, bytes::Bytes) {
    let response = match result {
        Ok(response) => response,
        Err(error) => error.into_response(),
    };
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

async fn get_playlist(h: &Harness, id: VideoId, resolution: &str) -> Result<Response, AppError> {
    playback::playlist(
        State(h.state.clone()),
        UrlPath((id, resolution.to_string())),
        auth_headers(),
    )
    .await
}

async fn get_segment(
    h: &Harness,
    id: VideoId,
    resolution: &str,
    segment: &str,
) -> Result<Response, AppError> {
    playback::segment(
        State(h.state.clone()),
        UrlPath((id, resolution.to_string(), segment.to_string())),
        auth_headers(),
    )
    .await
}

#[tokio::test]
async fn transcoded_video_streams_end_to_end() {
    let h = harness(Arc::new(ScriptedEncoder::ok()));
    let (record, _) = upload_movie(&h).await;
    run_pending_job(&h).await;

    // Every rendition exists and its manifest references only segments that
    // are actually on disk.
    for rendition in Rendition::ALL {
        let playlist_path = h.layout.playlist_path(record.id, rendition);
        let manifest = tokio::fs::read_to_string(&playlist_path).await.unwrap();
        let playlist = MediaPlaylist::parse(&manifest).unwrap();
        assert!(!playlist.segments.is_empty());
        assert!(playlist.end_list);
        for segment in &playlist.segments {
            let segment_path = h
                .layout
                .segment_path(record.id, rendition, &segment.uri)
                .unwrap();
            assert!(
                tokio::fs::metadata(&segment_path).await.is_ok(),
                "{} missing",
                segment.uri
            );
        }
    }

    // Served manifest matches the file on disk, byte for byte.
    let response = get_playlist(&h, record.id, "720p").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.apple.mpegurl"
    );
    let served = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let on_disk = tokio::fs::read(h.layout.playlist_path(record.id, Rendition::R720p))
        .await
        .unwrap();
    assert_eq!(served.as_ref(), on_disk.as_slice());

    // Segments stream with the transport content type.
    let response = get_segment(&h, record.id, "720p", "720p0.ts").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "video/MP2T"
    );
}

#[tokio::test]
async fn rerunning_a_job_overwrites_cleanly() {
    let h = harness(Arc::new(ScriptedEncoder::ok()));
    let (record, _) = upload_movie(&h).await;
    let job = run_pending_job(&h).await;

    // Same job again, as if the queue delivered a duplicate.
    h.transcoder.convert_to_hls(&job).await.unwrap();

    let mut entries = std::fs::read_dir(h.layout.video_dir(record.id))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    entries.sort();
    assert_eq!(entries, ["1080p", "480p", "720p", "source.mp4"]);

    let (status, _) = response_parts(get_playlist(&h, record.id, "480p").await).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_video_and_missing_rendition_answer_identically() {
    let h = harness(Arc::new(ScriptedEncoder::failing(Rendition::R1080p)));
    let (record, _) = upload_movie(&h).await;
    run_pending_job(&h).await;

    let unknown_video = response_parts(get_playlist(&h, 9999, "720p").await).await;
    let missing_rendition = response_parts(get_playlist(&h, record.id, "1080p").await).await;
    let traversal = response_parts(get_segment(&h, record.id, "720p", "../source.mp4").await).await;

    assert_eq!(unknown_video.0, StatusCode::NOT_FOUND);
    assert_eq!(unknown_video, missing_rendition);
    assert_eq!(unknown_video, traversal);
}

#[tokio::test]
async fn failed_rendition_leaves_the_others_playable() {
    let h = harness(Arc::new(ScriptedEncoder::failing(Rendition::R1080p)));
    let (record, job_id) = upload_movie(&h).await;
    run_pending_job(&h).await;

    for resolution in ["480p", "720p"] {
        let (status, _) = response_parts(get_playlist(&h, record.id, resolution).await).await;
        assert_eq!(status, StatusCode::OK, "{resolution} should be playable");
    }
    let (status, _) = response_parts(get_playlist(&h, record.id, "1080p").await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The job still completed, with the failure recorded per rendition.
    let report = h.status.get(&job_id).await.unwrap().unwrap();
    assert_eq!(report.state, JobState::Completed);
    let broken = report
        .renditions
        .iter()
        .find(|o| o.rendition == Rendition::R1080p)
        .unwrap();
    let RenditionStatus::Failed { message } = &broken.status else {
        panic!("expected 1080p to fail");
    };
    assert!(message.contains("Conversion failed"));

    // Nothing half-written remains.
    assert!(
        tokio::fs::metadata(h.layout.rendition_tmp_dir(record.id, Rendition::R1080p))
            .await
            .is_err()
    );
    assert!(
        tokio::fs::metadata(h.layout.rendition_dir(record.id, Rendition::R1080p))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn status_endpoint_reflects_partial_success() {
    let h = harness(Arc::new(ScriptedEncoder::failing(Rendition::R480p)));
    let (record, _) = upload_movie(&h).await;

    // Before any worker ran the job is visibly queued.
    let report = h.service.job_status(record.id).await.unwrap();
    assert_eq!(report.state, JobState::Queued);

    run_pending_job(&h).await;

    let report = h.service.job_status(record.id).await.unwrap();
    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.renditions.len(), 3);
    assert_eq!(
        report.renditions.iter().filter(|o| o.is_ready()).count(),
        2
    );
}

/// Catalog wrapper that records whether any call got through.
struct RecordingCatalog {
    inner: InMemoryCatalog,
    touched: Arc<AtomicBool>,
}

#[async_trait]
impl Catalog for RecordingCatalog {
    async fn allocate_id(&self) -> Result<VideoId, AppError> {
        self.touched.store(true, Ordering::SeqCst);
        self.inner.allocate_id().await
    }

    async fn insert(&self, record: VideoRecord) -> Result<(), AppError> {
        self.touched.store(true, Ordering::SeqCst);
        self.inner.insert(record).await
    }

    async fn get(&self, id: VideoId) -> Result<Option<VideoRecord>, AppError> {
        self.touched.store(true, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<VideoRecord>, AppError> {
        self.touched.store(true, Ordering::SeqCst);
        self.inner.list().await
    }

    async fn remove(&self, id: VideoId) -> Result<Option<VideoRecord>, AppError> {
        self.touched.store(true, Ordering::SeqCst);
        self.inner.remove(id).await
    }
}

#[tokio::test]
async fn anonymous_requests_never_reach_the_catalog() {
    let root = TempDir::new().unwrap();
    let layout = HlsLayout::new(root.path());
    let touched = Arc::new(AtomicBool::new(false));
    let catalog = Arc::new(RecordingCatalog {
        inner: InMemoryCatalog::new(),
        touched: touched.clone(),
    });
    let status = Arc::new(InMemoryJobStatus::new());
    let queue = Arc::new(ChannelQueue::new());
    let service = Arc::new(VideoService::new(catalog, queue, status, layout));
    let state = AppState {
        service,
        auth: Arc::new(StaticTokenAuth::new(TOKEN)),
    };

    // No Authorization header at all.
    let result = playback::playlist(
        State(state.clone()),
        UrlPath((1, "720p".to_string())),
        HeaderMap::new(),
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));

    // Wrong token.
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_static("Bearer wrong"),
    );
    let result = playback::segment(
        State(state),
        UrlPath((1, "720p".to_string(), "720p0.ts".to_string())),
        headers,
    )
    .await;
    assert!(matches!(result, Err(AppError::Unauthorized)));

    assert!(
        !touched.load(Ordering::SeqCst),
        "catalog must not be consulted before authorization"
    );
}

#[tokio::test]
async fn traversal_components_never_touch_the_filesystem() {
    let h = harness(Arc::new(ScriptedEncoder::ok()));
    let (record, _) = upload_movie(&h).await;
    run_pending_job(&h).await;

    for bad in ["../source.mp4", "..", "720p/../../source.mp4", "/etc/passwd"] {
        let (status, _) = response_parts(get_segment(&h, record.id, "720p", bad).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{bad:?} must not resolve");
    }

    // Bogus resolutions fall out before path resolution.
    let (status, _) = response_parts(get_playlist(&h, record.id, "..").await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // PLAYLIST_NAME itself is not a valid segment name, so the manifest
    // cannot be fetched with the transport content type.
    let (status, _) = response_parts(get_segment(&h, record.id, "720p", PLAYLIST_NAME).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_video_removes_its_artifacts() {
    let h = harness(Arc::new(ScriptedEncoder::ok()));
    let (record, _) = upload_movie(&h).await;
    run_pending_job(&h).await;

    h.service.delete_video(record.id).await.unwrap();

    assert!(tokio::fs::metadata(h.layout.video_dir(record.id))
        .await
        .is_err());
    let (status, _) = response_parts(get_playlist(&h, record.id, "720p").await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
