//! Frame sampling with degenerate-frame filtering.
//!
//! Walks a video source at a fixed 2-second cadence, seeking directly to
//! each sampled position so a decode failure is isolated to that position.
//! Uniform-color frames are skipped without consuming an output frame
//! number, so emitted numbering stays dense over kept frames.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::imageops::FilterType;
use image::DynamicImage;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use vidseq_core::defaults::{
    FRAME_JPEG_QUALITY, FRAME_TARGET_WIDTH, MEDIA_CMD_TIMEOUT_SECS, SAMPLE_STRIDE_SECS,
};
use vidseq_core::{Error, Result};

use crate::probe::probe_video;

/// One kept frame produced by the sampler.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Ordinal over kept frames, dense from 0.
    pub frame_number: u64,
    /// Source position in seconds.
    pub timestamp: f64,
    /// Path of the persisted JPEG.
    pub frame_path: String,
    /// Encoded JPEG bytes, already resized for the provider.
    pub jpeg: Vec<u8>,
}

/// Lazy, finite, single-use frame sampler over one video source.
///
/// Construction probes the source (failing with `SourceUnavailable` if it
/// cannot be opened); each [`FrameSampler::next`] call extracts one sampled
/// position. A mid-stream extraction failure ends the stream early;
/// partial results are valid, not an error.
#[derive(Debug)]
pub struct FrameSampler {
    video_path: PathBuf,
    task_id: String,
    frames_dir: PathBuf,
    work_dir: TempDir,
    fps: f64,
    stride_frames: u64,
    total_positions: u64,
    position: u64,
    next_frame_number: u64,
    skipped: u64,
    finished: bool,
}

impl FrameSampler {
    /// Open a sampler over `video_path`, persisting kept frames under
    /// `frames_dir` with a `task_id`-scoped filename prefix.
    pub async fn open(video_path: &Path, task_id: &str, frames_dir: &Path) -> Result<Self> {
        let probe = probe_video(video_path).await?;
        let stride_frames = stride_for_fps(probe.fps);
        let total_positions = probe.frame_count / stride_frames;

        tokio::fs::create_dir_all(frames_dir).await?;
        let work_dir = TempDir::new()?;

        debug!(
            video_path = %video_path.display(),
            fps = probe.fps,
            stride_frames,
            total_positions,
            "Opened frame sampler"
        );

        Ok(Self {
            video_path: video_path.to_path_buf(),
            task_id: task_id.to_string(),
            frames_dir: frames_dir.to_path_buf(),
            work_dir,
            fps: probe.fps,
            stride_frames,
            total_positions,
            position: 0,
            next_frame_number: 0,
            skipped: 0,
            finished: false,
        })
    }

    /// Expected number of sampled positions; progress-percentage
    /// denominator only.
    pub fn total_expected(&self) -> u64 {
        self.total_positions
    }

    /// Frames skipped so far by the degenerate filter.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Produce the next kept frame, or None when the source is exhausted
    /// (or a mid-stream decode failed, in which case the stream just ends).
    pub async fn next(&mut self) -> Result<Option<SampledFrame>> {
        loop {
            if self.finished || self.position >= self.total_positions {
                return Ok(None);
            }

            let timestamp = (self.position * self.stride_frames) as f64 / self.fps;
            self.position += 1;

            let raw = match self.extract_at(timestamp).await {
                Ok(Some(img)) => img,
                Ok(None) | Err(_) => {
                    warn!(
                        video_path = %self.video_path.display(),
                        timestamp,
                        "Frame extraction failed mid-stream, ending sample run"
                    );
                    self.finished = true;
                    return Ok(None);
                }
            };

            if is_degenerate(&raw) {
                self.skipped += 1;
                trace!(timestamp, "Skipping degenerate frame");
                continue;
            }

            let resized = resize_for_provider(&raw, FRAME_TARGET_WIDTH);
            let jpeg = encode_jpeg(&resized)?;

            let frame_number = self.next_frame_number;
            self.next_frame_number += 1;

            let frame_path = self
                .frames_dir
                .join(format!("{}_frame_{}.jpg", self.task_id, frame_number));
            tokio::fs::write(&frame_path, &jpeg).await?;

            return Ok(Some(SampledFrame {
                frame_number,
                timestamp,
                frame_path: frame_path.to_string_lossy().into_owned(),
                jpeg,
            }));
        }
    }

    /// Seek to `timestamp` and decode one frame. Ok(None) means ffmpeg
    /// produced nothing at that position (typically end of stream).
    async fn extract_at(&self, timestamp: f64) -> Result<Option<DynamicImage>> {
        let out = self.work_dir.path().join("sample.png");
        // Remove any previous extraction so a silent ffmpeg no-op cannot
        // resurface a stale frame.
        let _ = tokio::fs::remove_file(&out).await;

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loglevel", "error", "-ss", &format!("{:.3}", timestamp), "-i"])
            .arg(&self.video_path)
            .args(["-frames:v", "1"])
            .arg(&out);

        let output =
            tokio::time::timeout(Duration::from_secs(MEDIA_CMD_TIMEOUT_SECS), cmd.output())
                .await
                .map_err(|_| {
                    Error::Internal(format!(
                        "frame extraction timed out after {}s",
                        MEDIA_CMD_TIMEOUT_SECS
                    ))
                })?
                .map_err(|e| Error::Internal(format!("failed to run ffmpeg: {}", e)))?;

        if !output.status.success() || !out.exists() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&out).await?;
        match image::load_from_memory(&bytes) {
            Ok(img) => Ok(Some(img)),
            Err(e) => {
                warn!(timestamp, error = %e, "Extracted frame failed to decode");
                Ok(None)
            }
        }
    }
}

/// Sampling stride in source frames for a 2-second cadence.
pub fn stride_for_fps(fps: f64) -> u64 {
    ((fps * SAMPLE_STRIDE_SECS).round() as u64).max(1)
}

/// True when the frame is visually degenerate: its luminance channel is a
/// single value (all-black frames are the common case).
pub fn is_degenerate(image: &DynamicImage) -> bool {
    let luma = image.to_luma8();
    let mut pixels = luma.pixels();
    let first = match pixels.next() {
        Some(p) => p[0],
        None => return true,
    };
    pixels.all(|p| p[0] == first)
}

/// Resize proportionally so width equals `target_width`, height rounded to
/// the nearest integer.
pub fn resize_for_provider(image: &DynamicImage, target_width: u32) -> DynamicImage {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 || w == target_width {
        return image.clone();
    }
    let target_height = ((h as f64) * (target_width as f64) / (w as f64)).round().max(1.0) as u32;
    image.resize_exact(target_width, target_height, FilterType::Triangle)
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, FRAME_JPEG_QUALITY);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| Error::Internal(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}
