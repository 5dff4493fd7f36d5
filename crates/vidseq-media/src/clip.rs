//! Clip extraction: cut an audio+video slice out of a source for
//! playback/download.
//!
//! The extracted file lives at a transient location guarded by [`TempClip`];
//! the guard travels inside the response stream so deletion happens on
//! normal completion, early disconnect, and error paths alike.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::fs::File;
use tokio::process::Command;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

use vidseq_core::defaults::MEDIA_CMD_TIMEOUT_SECS;
use vidseq_core::{Error, Result};

/// Owned handle to a transient clip file; deletes the file on drop.
#[derive(Debug)]
pub struct TempClip {
    path: PathBuf,
}

impl TempClip {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the clip as a byte stream. The guard moves into the stream, so
    /// the file outlives exactly as long as the consumer does.
    pub async fn into_stream(self) -> Result<ClipStream> {
        let file = File::open(&self.path).await?;
        Ok(ClipStream {
            inner: ReaderStream::new(file),
            _clip: self,
        })
    }
}

impl Drop for TempClip {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove transient clip");
            }
        }
    }
}

/// Byte stream over a transient clip, holding its deletion guard.
pub struct ClipStream {
    inner: ReaderStream<File>,
    _clip: TempClip,
}

impl Stream for ClipStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Download filename for a clip covering `[t_start, t_end]`.
pub fn clip_download_name(t_start: f64, t_end: f64) -> String {
    format!("sequence_{}-{}.mp4", t_start, t_end)
}

/// Extract `[t_start, t_end]` from `video_path` into a transient MP4
/// combining the source video and audio tracks, re-encoding as needed.
///
/// If the audio mapping fails (e.g. the source has no audio track), falls
/// back to a video-only output rather than failing the request.
pub async fn extract_clip(video_path: &Path, t_start: f64, t_end: f64) -> Result<TempClip> {
    if t_start < 0.0 || t_start >= t_end {
        return Err(Error::InvalidRange {
            start: t_start,
            end: t_end,
        });
    }

    let out = std::env::temp_dir().join(format!("vidseq_clip_{}.mp4", Uuid::new_v4()));
    let clip = TempClip { path: out };

    match run_extract(video_path, t_start, t_end, clip.path(), true).await {
        Ok(()) => {
            debug!(video_path = %video_path.display(), t_start, t_end, "Extracted clip with audio");
            Ok(clip)
        }
        Err(audio_err) => {
            warn!(
                video_path = %video_path.display(),
                error = %audio_err,
                "Audio extraction failed, retrying video-only"
            );
            run_extract(video_path, t_start, t_end, clip.path(), false)
                .await
                .map_err(|e| {
                    Error::SourceUnavailable(format!(
                        "clip extraction failed for {}: {}",
                        video_path.display(),
                        e
                    ))
                })?;
            Ok(clip)
        }
    }
}

async fn run_extract(
    video_path: &Path,
    t_start: f64,
    t_end: f64,
    out: &Path,
    with_audio: bool,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-y",
        "-loglevel",
        "error",
        "-ss",
        &format!("{:.3}", t_start),
        "-to",
        &format!("{:.3}", t_end),
        "-i",
    ])
    .arg(video_path)
    .args(["-map", "0:v:0"]);

    if with_audio {
        // Explicit audio mapping so a missing track is an error we can
        // fall back from, not a silent omission.
        cmd.args(["-map", "0:a:0", "-c:a", "aac"]);
    } else {
        cmd.arg("-an");
    }

    cmd.args(["-c:v", "libx264", "-preset", "veryfast", "-movflags", "+faststart"])
        .arg(out);

    let output = tokio::time::timeout(Duration::from_secs(MEDIA_CMD_TIMEOUT_SECS), cmd.output())
        .await
        .map_err(|_| {
            Error::Internal(format!(
                "clip extraction timed out after {}s",
                MEDIA_CMD_TIMEOUT_SECS
            ))
        })?
        .map_err(|e| Error::Internal(format!("failed to run ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Internal(format!(
            "ffmpeg failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn negative_start_is_invalid_range() {
        let err = extract_clip(Path::new("clip.mp4"), -1.0, 5.0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn inverted_range_is_invalid() {
        let err = extract_clip(Path::new("clip.mp4"), 8.0, 3.0).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRange {
                start,
                end
            } if start == 8.0 && end == 3.0
        ));
    }

    #[tokio::test]
    async fn empty_range_is_invalid() {
        let err = extract_clip(Path::new("clip.mp4"), 4.0, 4.0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn download_name_embeds_range() {
        assert_eq!(clip_download_name(10.0, 24.0), "sequence_10-24.mp4");
        assert_eq!(clip_download_name(2.5, 7.5), "sequence_2.5-7.5.mp4");
    }

    #[test]
    fn temp_clip_removes_file_on_drop() {
        let path = std::env::temp_dir().join(format!("vidseq_clip_test_{}.mp4", Uuid::new_v4()));
        std::fs::write(&path, b"stub").unwrap();
        assert!(path.exists());

        drop(TempClip { path: path.clone() });
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn clip_stream_drains_file_then_deletes() {
        use futures::StreamExt;

        let path = std::env::temp_dir().join(format!("vidseq_clip_test_{}.mp4", Uuid::new_v4()));
        std::fs::write(&path, b"clip-bytes").unwrap();

        let clip = TempClip { path: path.clone() };
        let mut stream = clip.into_stream().await.unwrap();

        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"clip-bytes");

        drop(stream);
        assert!(!path.exists());
    }
}
