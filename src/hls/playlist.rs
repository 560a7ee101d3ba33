use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PlaylistError {
    #[error("missing #EXTM3U header")]
    MissingHeader,
    #[error("malformed tag: {0}")]
    BadTag(String),
}

#[derive(Debug)]
pub struct MediaSegment {
    pub duration: f64,
    pub uri: String,
}

/// Minimal reader for the HLS media-playlist text format.
///
/// The encoder owns writing manifests; this parser exists so the engine can
/// check a finished rendition before publishing it, and so tests can assert
/// on what was produced. Unknown tags are skipped.
#[derive(Debug, Default)]
pub struct MediaPlaylist {
    pub version: Option<u32>,
    pub target_duration: Option<u64>,
    pub segments: Vec<MediaSegment>,
    pub end_list: bool,
}

impl MediaPlaylist {
    pub fn parse(text: &str) -> Result<Self, PlaylistError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        if lines.next() != Some("#EXTM3U") {
            return Err(PlaylistError::MissingHeader);
        }

        let mut playlist = MediaPlaylist::default();
        let mut pending_duration: Option<f64> = None;

        for line in lines {
            if let Some(rest) = line.strip_prefix("#EXT-X-VERSION:") {
                playlist.version = rest.parse().ok();
            } else if let Some(rest) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
                playlist.target_duration = rest.parse().ok();
            } else if let Some(rest) = line.strip_prefix("#EXTINF:") {
                let duration = rest
                    .split(',')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .parse()
                    .map_err(|_| PlaylistError::BadTag(line.to_string()))?;
                pending_duration = Some(duration);
            } else if line == "#EXT-X-ENDLIST" {
                playlist.end_list = true;
            } else if line.starts_with('#') {
                // Comment or a tag we don't care about
                continue;
            } else {
                playlist.segments.push(MediaSegment {
                    duration: pending_duration.take().unwrap_or(0.0),
                    uri: line.to_string(),
                });
            }
        }

        Ok(playlist)
    }
}
