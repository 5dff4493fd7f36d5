//! # vidseq-core
//!
//! Core types, traits, and abstractions for vidseq: the shared error type,
//! the frame/sequence data model, the capability traits behind which the
//! remote and local provider/index variants live, the per-task progress
//! channel, and the centralized default constants.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod progress;
pub mod timecode;
pub mod traits;

pub use error::{Error, Result};
pub use models::{
    FrameMatch, FrameRecord, ProgressEvent, SearchResponse, Sequence, TaskRecord, TaskState,
};
pub use progress::ProgressRegistry;
pub use timecode::format_timestamp;
pub use traits::{DescriptionBackend, EmbeddingBackend, FrameAnalysisProvider, VectorIndex};
