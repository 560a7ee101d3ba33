//! Catalog endpoints: listing, multipart upload, deletion, thumbnails and
//! per-video transcode status.

use super::{require_auth, stream_file, AppState};
use crate::application::orchestrator::StagedUpload;
use crate::domain::jobs::JobReport;
use crate::domain::video::{NewVideo, VideoId, VideoRecord};
use crate::error::AppError;
use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::{BoxError, Json};
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use std::io;
use std::path::Path as FsPath;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct VideoSummary {
    pub id: VideoId,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub category: String,
}

impl From<&VideoRecord> for VideoSummary {
    fn from(record: &VideoRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            title: record.title.clone(),
            description: record.description.clone(),
            thumbnail_url: record
                .thumbnail_path
                .as_ref()
                .map(|_| format!("/video/{}/thumbnail", record.id)),
            category: record.category.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedVideo {
    #[serde(flatten)]
    pub video: VideoSummary,
    pub job_id: String,
}

/// GET /video/
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<VideoSummary>>, AppError> {
    require_auth(&state, &headers)?;

    let records = state.service.list_videos().await?;
    Ok(Json(records.iter().map(VideoSummary::from).collect()))
}

/// POST /video/ with a multipart form: `title`, `description`, `category`,
/// the `video` file and an optional `thumbnail`. File parts are streamed
/// into staging; the record only exists once everything arrived.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedVideo>), AppError> {
    require_auth(&state, &headers)?;

    let staging = state.service.layout().staging_dir();
    tokio::fs::create_dir_all(&staging).await?;

    let mut new = NewVideo::default();
    let mut source: Option<StagedUpload> = None;
    let mut thumbnail: Option<StagedUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("title") => new.title = read_text(field).await?,
            Some("description") => new.description = read_text(field).await?,
            Some("category") => new.category = read_text(field).await?,
            Some("video") => source = Some(stage_field(&staging, field).await?),
            Some("thumbnail") => thumbnail = Some(stage_field(&staging, field).await?),
            _ => continue,
        }
    }

    let Some(source) = source else {
        if let Some(thumb) = &thumbnail {
            let _ = tokio::fs::remove_file(&thumb.path).await;
        }
        return Err(AppError::BadRequest("missing video file".into()));
    };
    if new.title.trim().is_empty() {
        let _ = tokio::fs::remove_file(&source.path).await;
        if let Some(thumb) = &thumbnail {
            let _ = tokio::fs::remove_file(&thumb.path).await;
        }
        return Err(AppError::BadRequest("missing title".into()));
    }

    let (record, job_id) = state.service.create_video(new, source, thumbnail).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedVideo {
            video: VideoSummary::from(&record),
            job_id,
        }),
    ))
}

/// GET /video/{video_id}/status
pub async fn status(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    headers: HeaderMap,
) -> Result<Json<JobReport>, AppError> {
    require_auth(&state, &headers)?;
    Ok(Json(state.service.job_status(video_id).await?))
}

/// GET /video/{video_id}/thumbnail
pub async fn thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_auth(&state, &headers)?;

    let record = state.service.get_video(video_id).await?;
    let path = record.thumbnail_path.ok_or(AppError::NotFound)?;
    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();
    stream_file(&path, &content_type).await
}

/// DELETE /video/{video_id}
pub async fn remove(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    require_auth(&state, &headers)?;
    state.service.delete_video(video_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn stage_field(staging: &FsPath, field: Field<'_>) -> Result<StagedUpload, AppError> {
    let file_name = field.file_name().unwrap_or("upload.bin").to_owned();
    let path = staging.join(Uuid::new_v4().to_string());
    stream_to_file(&path, field).await?;
    Ok(StagedUpload { path, file_name })
}

// Save a `Stream` to a file
async fn stream_to_file<S, E>(path: &FsPath, stream: S) -> Result<(), AppError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);

    let mut file = BufWriter::new(File::create(path).await?);
    tokio::io::copy(&mut body_reader, &mut file).await?;
    file.flush().await?;

    Ok(())
}
