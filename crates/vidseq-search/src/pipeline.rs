//! Query pipeline: embed the query, fetch top-k frame matches, assemble
//! ranked sequences.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use vidseq_core::defaults::SEARCH_TOP_K;
use vidseq_core::{
    EmbeddingBackend, FrameAnalysisProvider, ProgressEvent, ProgressRegistry, Result, Sequence,
    VectorIndex,
};

use crate::assembler::assemble_sequences;

/// Search over the indexed corpus via the configured provider and index.
pub struct SearchPipeline {
    provider: Arc<dyn FrameAnalysisProvider>,
    index: Arc<dyn VectorIndex>,
    progress: Arc<ProgressRegistry>,
    top_k: usize,
}

impl SearchPipeline {
    pub fn new(
        provider: Arc<dyn FrameAnalysisProvider>,
        index: Arc<dyn VectorIndex>,
        progress: Arc<ProgressRegistry>,
    ) -> Self {
        Self {
            provider,
            index,
            progress,
            top_k: SEARCH_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Run one query, streaming coarse phase updates to any observer
    /// registered under `task_id`.
    ///
    /// Errors surface synchronously to the caller; the progress channel
    /// only carries phase labels here, not failure signaling.
    pub async fn search(&self, task_id: Uuid, query: &str) -> Result<Vec<Sequence>> {
        let start = Instant::now();

        self.progress
            .publish(task_id, ProgressEvent::status(0, "embedding query"))
            .await;
        let query_vector = self.provider.embed(query).await?;

        self.progress
            .publish(task_id, ProgressEvent::status(40, "searching index"))
            .await;
        let matches = self.index.query(&query_vector, self.top_k).await?;
        debug!(query, result_count = matches.len(), "Index query complete");

        self.progress
            .publish(task_id, ProgressEvent::status(80, "assembling sequences"))
            .await;
        let sequences = assemble_sequences(matches);

        self.progress
            .publish(task_id, ProgressEvent::completed())
            .await;

        info!(
            query,
            result_count = sequences.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidseq_core::{EmbeddingBackend, FrameRecord};
    use vidseq_index::LocalVectorIndex;
    use vidseq_inference::MockProvider;

    fn record(n: u64, description: &str) -> FrameRecord {
        FrameRecord {
            task_id: "t1".to_string(),
            video_path: "videos/t1_demo.mp4".to_string(),
            frame_number: n,
            timestamp: n as f64 * 2.0,
            frame_path: format!("frames/t1_frame_{}.jpg", n),
            description: description.to_string(),
        }
    }

    async fn seeded_pipeline(dir: &std::path::Path) -> SearchPipeline {
        let provider = Arc::new(MockProvider::new(8));
        let index = Arc::new(LocalVectorIndex::open(dir, 8).await.unwrap());

        // Two adjacent frames matching the query text exactly, plus one
        // distant frame: the adjacent pair should assemble and rank first.
        for (n, text) in [
            (0, "a dog running on a beach"),
            (1, "a dog running on a beach"),
            (7, "an office desk with monitors"),
        ] {
            let rec = record(n, text);
            let vector = provider.embed(text).await.unwrap();
            index.upsert(&rec.embedding_id(), &vector, &rec).await.unwrap();
        }

        SearchPipeline::new(provider, index, Arc::new(ProgressRegistry::new()))
    }

    #[tokio::test]
    async fn search_returns_assembled_sequences() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = seeded_pipeline(dir.path()).await;

        let sequences = pipeline
            .search(Uuid::new_v4(), "a dog running on a beach")
            .await
            .unwrap();

        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].frame_start, 0);
        assert_eq!(sequences[0].frame_end, 1);
        // Exact-match embeddings sit at distance 0 → similarity 1.
        assert!((sequences[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_streams_phase_updates_to_observer() {
        let dir = tempfile::tempdir().unwrap();
        let progress = Arc::new(ProgressRegistry::new());
        let provider = Arc::new(MockProvider::new(8));
        let index = Arc::new(LocalVectorIndex::open(dir.path(), 8).await.unwrap());
        let pipeline = SearchPipeline::new(provider, index, progress.clone());

        let task_id = Uuid::new_v4();
        let mut rx = progress.subscribe(task_id).await;

        pipeline.search(task_id, "anything").await.unwrap();

        let mut statuses = Vec::new();
        while let Some(event) = rx.recv().await {
            statuses.push((event.progress, event.status));
        }
        assert_eq!(statuses.len(), 4);
        assert_eq!(statuses[0].1.as_deref(), Some("embedding query"));
        assert_eq!(statuses.last().unwrap().0, 100);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new(8));
        provider.set_fail_embed(true);
        let index = Arc::new(LocalVectorIndex::open(dir.path(), 8).await.unwrap());
        let pipeline = SearchPipeline::new(provider, index, Arc::new(ProgressRegistry::new()));

        let err = pipeline.search(Uuid::new_v4(), "anything").await.unwrap_err();
        assert!(matches!(err, vidseq_core::Error::Provider { .. }));
    }
}
