//! Capability traits for vidseq's pluggable backends.
//!
//! The ingestion orchestrator and search pipeline are written against these
//! seams only; the remote/local variants are selected once per process from
//! configuration and passed in as trait objects.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FrameMatch, FrameRecord};

/// Backend that turns a frame image into a natural-language description.
#[async_trait]
pub trait DescriptionBackend: Send + Sync {
    /// Describe one frame image (encoded bytes, e.g. JPEG).
    async fn describe(&self, image_data: &[u8], mime_type: &str) -> Result<String>;

    /// Short backend identifier for logs and error attribution.
    fn backend_name(&self) -> &str;
}

/// Backend that turns text into a fixed-dimension embedding vector.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed one text. All vectors from one backend share a dimension.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The embedding dimension.
    ///
    /// Remote backends know this statically; the local backend discovers it
    /// from its first successful embedding call, so the accessor is async
    /// and may perform that call.
    async fn dimension(&self) -> Result<usize>;

    /// Short backend identifier for logs and error attribution.
    fn backend_name(&self) -> &str;
}

/// Combined description + embedding capability used by the orchestrator
/// and the search pipeline.
#[async_trait]
pub trait FrameAnalysisProvider: DescriptionBackend + EmbeddingBackend {
    /// Check whether the backing service is reachable.
    ///
    /// A `false` result before ingestion starts is a whole-task failure;
    /// transient mid-task failures are handled per-frame instead.
    async fn health_check(&self) -> Result<bool>;
}

/// Durable store mapping embeddings to frame metadata with top-k
/// similarity query.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite one embedding record.
    async fn upsert(&self, id: &str, vector: &[f32], metadata: &FrameRecord) -> Result<()>;

    /// Return up to `k` matches ranked best-first.
    ///
    /// Scores are "higher is better" on both variants; see [`FrameMatch`]
    /// for the comparability caveat between remote similarity and local
    /// `1 - distance`.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<FrameMatch>>;
}
