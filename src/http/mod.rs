//! Inbound HTTP surface: catalog endpoints plus the playlist/segment
//! file-serving contract used by playback clients.

pub mod playback;
pub mod videos;

use crate::application::orchestrator::VideoService;
use crate::error::AppError;
use crate::ports::auth::TokenAuth;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing::{delete, get};
use axum::Router;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const SEGMENT_CONTENT_TYPE: &str = "video/MP2T";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VideoService>,
    pub auth: Arc<dyn TokenAuth>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/video/", get(videos::list).post(videos::create))
        .route("/video/:video_id", delete(videos::remove))
        .route("/video/:video_id/status", get(videos::status))
        .route("/video/:video_id/thumbnail", get(videos::thumbnail))
        .route(
            "/video/:video_id/:resolution/index.m3u8",
            get(playback::playlist),
        )
        .route(
            "/video/:video_id/:resolution/:segment",
            get(playback::segment),
        )
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Every handler calls this first; nothing else runs for an anonymous
/// caller.
pub(crate) fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if state.auth.is_authorized(bearer_token(headers)) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Stream a file off the store. An absent file answers `NotFound`, the same
/// shape as an unknown video.
pub(crate) async fn stream_file(path: &Path, content_type: &str) -> Result<Response, AppError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata().await?;
    if metadata.is_dir() {
        return Err(AppError::NotFound);
    }

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, metadata.len())
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(e.to_string()))
}
