//! Structured logging field name constants for vidseq.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (matches, frames) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "media", "inference", "index", "search", "ingest"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "sampler", "ollama", "remote_index", "assembler"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "describe", "embed", "upsert", "query", "extract_clip"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Task UUID being processed.
pub const TASK_ID: &str = "task_id";

/// Source video path.
pub const VIDEO_PATH: &str = "video_path";

/// Kept-frame ordinal within a video.
pub const FRAME_NUMBER: &str = "frame_number";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of frames indexed so far.
pub const INDEXED_COUNT: &str = "indexed_count";

/// Number of frames skipped (degenerate or per-frame failure).
pub const SKIPPED_COUNT: &str = "skipped_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for description or embedding.
pub const MODEL: &str = "model";

/// Provider backend identifier ("remote" / "ollama").
pub const BACKEND: &str = "backend";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
