//! Playlist and segment serving.
//!
//! The response contract is fixed: manifests go out as
//! `application/vnd.apple.mpegurl`, segments as `video/MP2T`, and every
//! miss (unknown video, rendition never produced, segment name that does
//! not resolve) is the same 404.

use super::{require_auth, stream_file, AppState, PLAYLIST_CONTENT_TYPE, SEGMENT_CONTENT_TYPE};
use crate::domain::rendition::Rendition;
use crate::domain::video::VideoId;
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

/// GET /video/{video_id}/{resolution}/index.m3u8
pub async fn playlist(
    State(state): State<AppState>,
    Path((video_id, resolution)): Path<(VideoId, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&state, &headers)?;

    let rendition = Rendition::from_label(&resolution).ok_or(AppError::NotFound)?;
    state.service.get_video(video_id).await?;

    let path = state.service.layout().playlist_path(video_id, rendition);
    stream_file(&path, PLAYLIST_CONTENT_TYPE).await
}

/// GET /video/{video_id}/{resolution}/{segment}
pub async fn segment(
    State(state): State<AppState>,
    Path((video_id, resolution, segment)): Path<(VideoId, String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&state, &headers)?;

    let rendition = Rendition::from_label(&resolution).ok_or(AppError::NotFound)?;
    state.service.get_video(video_id).await?;

    let path = state
        .service
        .layout()
        .segment_path(video_id, rendition, &segment)?;
    stream_file(&path, SEGMENT_CONTENT_TYPE).await
}
