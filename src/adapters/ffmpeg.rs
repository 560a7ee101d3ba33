use crate::domain::rendition::Rendition;
use crate::ports::encoder::EncoderRunner;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Drives the system `ffmpeg` binary, one invocation per rendition.
///
/// Flags pin the output contract: h264/aac, 10 s segment target, unbounded
/// playlist, segments numbered from 0 under the given filename pattern,
/// existing output overwritten so re-runs are safe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegEncoder;

#[async_trait]
impl EncoderRunner for FfmpegEncoder {
    async fn run_hls_encode(
        &self,
        source: &Path,
        rendition: Rendition,
        playlist_path: &Path,
        segment_pattern: &Path,
    ) -> io::Result<Output> {
        let (width, height) = rendition.dimensions();

        Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(source)
            .args(["-vf", &format!("scale={}:{}", width, height)])
            .args(["-c:v", "h264"])
            .args(["-c:a", "aac"])
            .args(["-f", "hls"])
            .args(["-hls_time", "10"])
            .args(["-hls_list_size", "0"])
            .args(["-start_number", "0"])
            .arg("-hls_segment_filename")
            .arg(segment_pattern)
            .arg(playlist_path)
            .output()
            .await
    }
}
