use crate::domain::rendition::Rendition;
use crate::domain::video::VideoId;
use crate::error::AppError;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Manifest filename inside every rendition directory.
pub const PLAYLIST_NAME: &str = "index.m3u8";

/// Resolves every on-disk location derived from a video identifier.
///
/// Write side (engine) and read side (playback) go through the same scheme:
///
/// ```text
/// {media_root}/videos/{id}/source.mp4
/// {media_root}/videos/{id}/{resolution}/index.m3u8
/// {media_root}/videos/{id}/{resolution}/{resolution}{N}.ts
/// ```
///
/// Paths are keyed by the stable id, never by the source filename, so
/// renames of the upload can't orphan artifacts. Segment names are
/// validated before they are joined to anything.
#[derive(Debug, Clone)]
pub struct HlsLayout {
    media_root: PathBuf,
    segment_name: Regex,
}

impl HlsLayout {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
            segment_name: Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*\.ts$").unwrap(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Scratch space for in-flight uploads, on the same filesystem as the
    /// final locations so a rename is enough to publish.
    pub fn staging_dir(&self) -> PathBuf {
        self.media_root.join("tmp")
    }

    pub fn video_dir(&self, id: VideoId) -> PathBuf {
        self.media_root.join("videos").join(id.to_string())
    }

    pub fn source_path(&self, id: VideoId) -> PathBuf {
        self.video_dir(id).join("source.mp4")
    }

    pub fn rendition_dir(&self, id: VideoId, rendition: Rendition) -> PathBuf {
        self.video_dir(id).join(rendition.label())
    }

    /// Where the engine encodes before renaming into place. Hidden name so
    /// it can never collide with a rendition label.
    pub fn rendition_tmp_dir(&self, id: VideoId, rendition: Rendition) -> PathBuf {
        self.video_dir(id).join(format!(".{}.tmp", rendition.label()))
    }

    pub fn playlist_path(&self, id: VideoId, rendition: Rendition) -> PathBuf {
        self.rendition_dir(id, rendition).join(PLAYLIST_NAME)
    }

    /// Resolve a segment file, rejecting anything that is not a plain
    /// `name.ts` filename. Traversal attempts answer the same way as a
    /// segment that simply does not exist.
    pub fn segment_path(
        &self,
        id: VideoId,
        rendition: Rendition,
        segment: &str,
    ) -> Result<PathBuf, AppError> {
        if !self.is_valid_segment_name(segment) {
            return Err(AppError::NotFound);
        }
        Ok(self.rendition_dir(id, rendition).join(segment))
    }

    pub fn is_valid_segment_name(&self, name: &str) -> bool {
        self.segment_name.is_match(name)
    }
}
