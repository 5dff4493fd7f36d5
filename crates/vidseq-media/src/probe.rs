//! Video source probing via ffprobe.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use vidseq_core::defaults::PROBE_TIMEOUT_SECS;
use vidseq_core::{Error, Result};

/// Basic stream facts needed to plan sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoProbe {
    /// Average frame rate of the first video stream.
    pub fps: f64,
    /// Total frame count (reported, or estimated from duration × fps).
    pub frame_count: u64,
    /// Container duration in seconds.
    pub duration_secs: f64,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe a video source with ffprobe.
///
/// Any failure here (missing file, unreadable container, no video stream)
/// is a whole-task [`Error::SourceUnavailable`].
pub async fn probe_video(path: &Path) -> Result<VideoProbe> {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=avg_frame_rate,nb_frames",
        "-show_entries",
        "format=duration",
        "-of",
        "json",
    ])
    .arg(path);

    let output = tokio::time::timeout(Duration::from_secs(PROBE_TIMEOUT_SECS), cmd.output())
        .await
        .map_err(|_| {
            Error::SourceUnavailable(format!(
                "ffprobe timed out after {}s for {}",
                PROBE_TIMEOUT_SECS,
                path.display()
            ))
        })?
        .map_err(|e| Error::SourceUnavailable(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::SourceUnavailable(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    let probe = parse_probe_output(&output.stdout)
        .ok_or_else(|| Error::SourceUnavailable(format!("no video stream in {}", path.display())))?;

    debug!(
        video_path = %path.display(),
        fps = probe.fps,
        frame_count = probe.frame_count,
        duration_secs = probe.duration_secs,
        "Probed video source"
    );

    Ok(probe)
}

/// Parse ffprobe JSON output into a [`VideoProbe`].
///
/// Returns None when no usable video stream is present.
fn parse_probe_output(stdout: &[u8]) -> Option<VideoProbe> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout).ok()?;
    let stream = parsed.streams.first()?;

    let fps = parse_rational(stream.avg_frame_rate.as_deref()?)?;
    if fps <= 0.0 {
        return None;
    }

    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    // nb_frames is absent for many containers; fall back to duration × fps.
    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or_else(|| (duration_secs * fps).floor() as u64);

    Some(VideoProbe {
        fps,
        frame_count,
        duration_secs,
    })
}

/// Parse an ffprobe rational like `"30000/1001"` (or a plain `"25"`).
fn parse_rational(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => s.parse().ok(),
    }
}
