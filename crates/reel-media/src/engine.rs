//! The media transform adapter.
//!
//! Each operation shells out to the external transcoding engine. Engine
//! failures are transient and propagate for queue retry; a missing or empty
//! input is caught beforehand and classified permanent.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Width of the generated preview frame; height follows the aspect ratio.
const PREVIEW_SCALE_WIDTH: u32 = 480;

/// Timestamp the preview frame is taken from.
const PREVIEW_TIMESTAMP_SECONDS: f64 = 1.0;

/// Named operations against the external transcoding engine.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Normalize the input into an MP4 container at `output`.
    async fn normalize(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Extract one preview frame as a JPEG at `output`.
    async fn extract_preview_frame(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Repackage the input into an HLS package under `out_dir`.
    ///
    /// Returns the manifest path. `segment_seconds` bounds manifest size
    /// versus seek granularity and is pipeline configuration, not a
    /// property of this adapter.
    async fn segment(
        &self,
        input: &Path,
        out_dir: &Path,
        segment_seconds: u32,
    ) -> MediaResult<PathBuf>;
}

/// `MediaEngine` backed by the ffmpeg CLI.
#[derive(Debug, Default, Clone)]
pub struct FfmpegEngine;

impl FfmpegEngine {
    pub fn new() -> Self {
        Self
    }

    /// Reject missing or empty inputs before invoking the engine.
    async fn check_input(input: &Path) -> MediaResult<()> {
        match tokio::fs::metadata(input).await {
            Ok(meta) if meta.len() == 0 => Err(MediaError::InvalidInput(format!(
                "{} is empty",
                input.display()
            ))),
            Ok(_) => Ok(()),
            Err(_) => Err(MediaError::InputNotFound(input.to_path_buf())),
        }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn normalize(&self, input: &Path, output: &Path) -> MediaResult<()> {
        Self::check_input(input).await?;

        let cmd = FfmpegCommand::new(input, output);
        FfmpegRunner::new().run(&cmd).await?;

        info!("Normalized {} to {}", input.display(), output.display());
        Ok(())
    }

    async fn extract_preview_frame(&self, input: &Path, output: &Path) -> MediaResult<()> {
        Self::check_input(input).await?;

        let filter = format!("thumbnail,scale={}:-2", PREVIEW_SCALE_WIDTH);
        let cmd = FfmpegCommand::new(input, output)
            .seek(PREVIEW_TIMESTAMP_SECONDS)
            .single_frame()
            .video_filter(filter);
        FfmpegRunner::new().run(&cmd).await?;

        info!("Extracted preview frame from {}", input.display());
        Ok(())
    }

    async fn segment(
        &self,
        input: &Path,
        out_dir: &Path,
        segment_seconds: u32,
    ) -> MediaResult<PathBuf> {
        Self::check_input(input).await?;

        tokio::fs::create_dir_all(out_dir).await?;
        let manifest = out_dir.join("vid.m3u8");

        let cmd = FfmpegCommand::new(input, &manifest)
            .codec_copy()
            .output_args(["-start_number", "0"])
            .output_args(["-hls_time", &segment_seconds.to_string()])
            .output_args(["-hls_list_size", "0"])
            .output_args(["-f", "hls"]);
        FfmpegRunner::new().run(&cmd).await?;

        // The engine exiting zero without a manifest counts as malformed output.
        if !manifest.exists() {
            return Err(MediaError::MalformedOutput(format!(
                "segmenter produced no manifest at {}",
                manifest.display()
            )));
        }

        info!(
            "Segmented {} into {} ({}s segments)",
            input.display(),
            out_dir.display(),
            segment_seconds
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_is_permanent() {
        let engine = FfmpegEngine::new();
        let dir = tempfile::tempdir().unwrap();
        let err = engine
            .normalize(&dir.path().join("absent.mp4"), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InputNotFound(_)));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn empty_input_is_permanent() {
        let engine = FfmpegEngine::new();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.mp4");
        tokio::fs::write(&input, b"").await.unwrap();

        let err = engine
            .extract_preview_frame(&input, &dir.path().join("out.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidInput(_)));
        assert!(err.is_permanent());
    }
}
