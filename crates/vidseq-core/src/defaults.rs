//! Centralized default constants for the vidseq system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers. Organized by domain area.

// =============================================================================
// SAMPLING
// =============================================================================

/// Seconds between evaluated source frames (the sampling stride).
pub const SAMPLE_STRIDE_SECS: f64 = 2.0;

/// Width (pixels) frames are resized to before description; height follows
/// proportionally with integer rounding.
pub const FRAME_TARGET_WIDTH: u32 = 1120;

/// JPEG quality for persisted frame images.
pub const FRAME_JPEG_QUALITY: u8 = 85;

// =============================================================================
// SEQUENCE ASSEMBLY
// =============================================================================

/// Maximum frame_number gap between consecutive matches merged into one
/// sequence. Tolerates exactly one missing sampled frame between matches.
pub const SEQUENCE_GAP_TOLERANCE: u64 = 2;

/// Minimum member frames for a sequence to survive assembly; isolated
/// matches are dropped entirely.
pub const SEQUENCE_MIN_FRAMES: usize = 2;

/// Default number of frame matches requested from the vector index.
pub const SEARCH_TOP_K: usize = 5;

// =============================================================================
// EMBEDDING / PROVIDER
// =============================================================================

/// Embedding dimension for the remote provider; must match the remote index.
pub const EMBED_DIMENSION: usize = 768;

/// Default local (Ollama) base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default local vision model for frame description.
pub const LOCAL_VISION_MODEL: &str = "llava";

/// Default local embedding model.
pub const LOCAL_EMBED_MODEL: &str = "mxbai-embed-large";

/// Default remote (OpenAI-compatible) base URL.
pub const REMOTE_BASE_URL: &str = "https://api.openai.com/v1";

/// Default remote vision-capable chat model.
pub const REMOTE_VISION_MODEL: &str = "gpt-4o-mini";

/// Default remote text-embedding model.
pub const REMOTE_EMBED_MODEL: &str = "text-embedding-3-small";

/// Timeout for frame description requests in seconds.
pub const DESCRIBE_TIMEOUT_SECS: u64 = 120;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// MEDIA
// =============================================================================

/// Per-command timeout for ffmpeg/ffprobe invocations (seconds).
pub const MEDIA_CMD_TIMEOUT_SECS: u64 = 60;

/// Timeout for source probing (seconds).
pub const PROBE_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// STORAGE LAYOUT
// =============================================================================

/// Directory for uploaded videos.
pub const VIDEO_DIR: &str = "videos";

/// Directory for persisted sampled frames.
pub const FRAME_DIR: &str = "frames";

/// Directory holding the local vector index file pair.
pub const VECTOR_DB_DIR: &str = "vector_db";

/// Local index vector blob filename (paired with [`METADATA_FILE`]).
pub const INDEX_FILE: &str = "index.bin";

/// Local index metadata filename (paired with [`INDEX_FILE`]).
pub const METADATA_FILE: &str = "metadata.json";

// =============================================================================
// SERVER / PROGRESS
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8080;

/// Per-task progress channel buffer capacity.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Maximum upload body size in bytes (512 MB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 512 * 1024 * 1024;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Selects the provider/index pair: `"remote"` or `"local"`.
pub const ENV_PROVIDER: &str = "VIDSEQ_PROVIDER";

/// Overrides the local vision model.
pub const ENV_LOCAL_VISION_MODEL: &str = "OLLAMA_VISION_MODEL";

/// Overrides the local embedding model.
pub const ENV_LOCAL_EMBED_MODEL: &str = "OLLAMA_EMBED_MODEL";

/// Overrides the Ollama base URL.
pub const ENV_OLLAMA_BASE: &str = "OLLAMA_BASE";

/// Remote provider API key.
pub const ENV_REMOTE_API_KEY: &str = "VIDSEQ_REMOTE_API_KEY";

/// Remote provider base URL.
pub const ENV_REMOTE_BASE_URL: &str = "VIDSEQ_REMOTE_BASE_URL";

/// Remote vision model override.
pub const ENV_REMOTE_VISION_MODEL: &str = "VIDSEQ_REMOTE_VISION_MODEL";

/// Remote embedding model override.
pub const ENV_REMOTE_EMBED_MODEL: &str = "VIDSEQ_REMOTE_EMBED_MODEL";

/// Hosted vector index base URL.
pub const ENV_INDEX_URL: &str = "VIDSEQ_INDEX_URL";

/// Hosted vector index API key.
pub const ENV_INDEX_API_KEY: &str = "VIDSEQ_INDEX_API_KEY";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_tolerance_covers_one_skipped_sample() {
        // One missing sampled frame between matches means a frame_number
        // delta of 2; the tolerance must admit exactly that.
        const {
            assert!(SEQUENCE_GAP_TOLERANCE == 2);
            assert!(SEQUENCE_MIN_FRAMES == 2);
        }
    }

    #[test]
    fn stride_is_two_seconds() {
        assert!((SAMPLE_STRIDE_SECS - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn index_files_are_distinct() {
        assert_ne!(INDEX_FILE, METADATA_FILE);
    }
}
