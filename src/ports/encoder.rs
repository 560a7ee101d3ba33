use crate::domain::rendition::Rendition;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;

/// Process-execution seam for the external encoder.
///
/// One invocation produces one complete segmented HLS rendition: the
/// manifest at `playlist_path` plus numbered segments following
/// `segment_pattern` in the same directory. Exit status and stderr are
/// returned to the caller; nothing is interpreted here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EncoderRunner: Send + Sync {
    async fn run_hls_encode(
        &self,
        source: &Path,
        rendition: Rendition,
        playlist_path: &Path,
        segment_pattern: &Path,
    ) -> io::Result<Output>;
}
