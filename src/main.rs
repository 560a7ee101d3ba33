//! Monolith binary: HTTP surface plus the transcoding worker pool in one
//! process.
//!
//! It wires up:
//! - In-memory catalog and job-status adapters
//! - Channel-backed job queue
//! - ffmpeg encoder behind the process-execution port
//! - axum router for catalog and playback endpoints

use kino::adapters::{
    ChannelQueue, FfmpegEncoder, InMemoryCatalog, InMemoryJobStatus, StaticTokenAuth,
};
use kino::application::orchestrator::VideoService;
use kino::application::worker::{TranscodeOptions, TranscodeService, WorkerPool};
use kino::config::AppConfig;
use kino::hls::HlsLayout;
use kino::http::{self, AppState};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt::init();

    // 1. Layout and media root
    let layout = HlsLayout::new(&config.media_root);
    tokio::fs::create_dir_all(layout.staging_dir())
        .await
        .expect("Failed to create media root");

    // 2. Adapters
    let catalog = Arc::new(InMemoryCatalog::new());
    let status = Arc::new(InMemoryJobStatus::new());
    let queue = Arc::new(ChannelQueue::new());
    let auth = Arc::new(StaticTokenAuth::new(&config.api_token));

    // 3. Application services
    let service = Arc::new(VideoService::new(
        catalog,
        queue.clone(),
        status.clone(),
        layout.clone(),
    ));
    let transcoder = Arc::new(TranscodeService::new(
        Arc::new(FfmpegEncoder),
        status,
        layout,
        TranscodeOptions {
            encode_timeout: Duration::from_secs(config.encode_timeout_secs),
            ..TranscodeOptions::default()
        },
    ));

    // 4. Workers
    let pool = WorkerPool::new(queue, transcoder);
    pool.start(config.workers);
    tracing::info!(workers = config.workers, "transcoding workers started");

    // 5. HTTP layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = http::router(AppState { service, auth }).layer(cors);

    // 6. Start server
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!("listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
