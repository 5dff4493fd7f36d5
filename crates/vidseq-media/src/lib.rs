//! # vidseq-media
//!
//! Media-facing components of vidseq: source probing, stride-based frame
//! sampling with degenerate-frame filtering, and clip extraction. Raw
//! decode/encode is delegated to `ffmpeg`/`ffprobe` subprocesses with
//! per-command timeouts; this crate owns the sampling and cleanup policy
//! around them.

pub mod clip;
pub mod probe;
pub mod sampler;

pub use clip::{clip_download_name, extract_clip, ClipStream, TempClip};
pub use probe::{probe_video, VideoProbe};
pub use sampler::{FrameSampler, SampledFrame};
