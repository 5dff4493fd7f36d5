//! Shared data model types for vidseq.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata stored alongside every indexed frame embedding.
///
/// `frame_number` is 0-based and dense over *kept* frames only: degenerate
/// frames advance the source cursor but never the emitted numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Ingestion task that produced this frame.
    pub task_id: String,
    /// Source video path the frame was sampled from.
    pub video_path: String,
    /// Ordinal over kept frames, strictly increasing per video.
    pub frame_number: u64,
    /// Position in the source, seconds from start.
    pub timestamp: f64,
    /// Path of the persisted frame image.
    pub frame_path: String,
    /// Provider-generated natural-language description.
    pub description: String,
}

impl FrameRecord {
    /// Embedding record identifier: `<task_id>_frame_<frame_number>`.
    pub fn embedding_id(&self) -> String {
        format!("{}_frame_{}", self.task_id, self.frame_number)
    }
}

/// A scored frame returned by a vector index query.
///
/// `score` is "higher is better" on both index paths. The remote index
/// reports provider similarity (cosine, in [-1, 1] or proportional); the
/// local index reports `1 - distance` over exact L2. The two are comparable
/// only approximately and are never mixed within one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMatch {
    #[serde(flatten)]
    pub record: FrameRecord,
    pub score: f32,
}

/// A contiguous run of ≥2 matched frames within one video, treated as a
/// single retrievable moment. Derived per query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub video_path: String,
    pub frame_start: u64,
    pub frame_end: u64,
    /// First member timestamp, seconds.
    pub time_start: f64,
    /// Last member timestamp, seconds.
    pub time_end: f64,
    /// `time_start` formatted `HH:MM:SS`.
    pub time_start_hms: String,
    /// `time_end` formatted `HH:MM:SS`.
    pub time_end_hms: String,
    pub duration: f64,
    /// Arithmetic mean of member scores.
    pub score: f32,
    /// Description of the first member frame.
    pub description: String,
    /// Persisted image paths of the member frames, in frame order.
    pub frame_paths: Vec<String>,
    /// Member matches, sorted by frame_number ascending.
    pub matches: Vec<FrameMatch>,
}

/// Response body for a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub sequences: Vec<Sequence>,
}

/// Lifecycle state of an ingestion or search task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Created,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    /// True once the task can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// A tracked background task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    /// Source video for ingestion tasks; None for search tasks.
    pub video_path: Option<String>,
}

/// A single progress update delivered over a task's progress channel.
///
/// `progress` is in `[-1, 100]`: `-1` signals fatal failure (with `error`
/// populated), `100` signals success, anything between is percent complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub progress: i32,
    #[serde(default)]
    pub error: String,
    /// Optional coarse phase label (search status updates).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ProgressEvent {
    /// A percent-complete update.
    pub fn percent(progress: i32) -> Self {
        Self {
            progress,
            error: String::new(),
            status: None,
        }
    }

    /// The terminal success event.
    pub fn completed() -> Self {
        Self::percent(100)
    }

    /// The terminal failure event (`progress = -1`).
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            progress: -1,
            error: error.into(),
            status: None,
        }
    }

    /// A coarse phase update carrying no percentage change.
    pub fn status(progress: i32, status: impl Into<String>) -> Self {
        Self {
            progress,
            error: String::new(),
            status: Some(status.into()),
        }
    }

    /// True for events after which no further delivery is attempted.
    pub fn is_terminal(&self) -> bool {
        self.progress == -1 || self.progress == 100
    }
}
