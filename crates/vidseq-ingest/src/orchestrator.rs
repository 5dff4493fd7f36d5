//! Ingestion orchestration: sample → describe → embed → index, with
//! per-frame progress reporting.
//!
//! Per-frame provider/index failures are absorbed as skips; whole-task
//! failures (source unavailable, backend unreachable before starting)
//! publish `-1` once and mark the task failed. Successful completion
//! always ends with a final `100`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use vidseq_core::defaults::FRAME_DIR;
use vidseq_core::{
    DescriptionBackend, EmbeddingBackend, Error, FrameAnalysisProvider, FrameRecord,
    ProgressEvent, ProgressRegistry, Result, TaskState, VectorIndex,
};
use vidseq_media::{FrameSampler, SampledFrame};

use crate::task::TaskRegistry;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Directory where sampled frames are persisted.
    pub frames_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from(FRAME_DIR),
        }
    }
}

/// Counters for one completed ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Frames described, embedded, and upserted.
    pub indexed: u64,
    /// Frames dropped: degenerate, or failed per-frame.
    pub skipped: u64,
}

/// Drives the sampler → provider → index pipeline for one video per task.
pub struct IngestOrchestrator {
    provider: Arc<dyn FrameAnalysisProvider>,
    index: Arc<dyn VectorIndex>,
    progress: Arc<ProgressRegistry>,
    tasks: Arc<TaskRegistry>,
    config: IngestConfig,
}

impl IngestOrchestrator {
    pub fn new(
        provider: Arc<dyn FrameAnalysisProvider>,
        index: Arc<dyn VectorIndex>,
        progress: Arc<ProgressRegistry>,
        tasks: Arc<TaskRegistry>,
        config: IngestConfig,
    ) -> Self {
        Self {
            provider,
            index,
            progress,
            tasks,
            config,
        }
    }

    /// Run ingestion for one task to completion. Never returns an error:
    /// all failure reporting goes through the progress channel and the
    /// task registry.
    pub async fn run(&self, task_id: Uuid, video_path: PathBuf) {
        self.tasks.set_state(task_id, TaskState::Running).await;

        match self.ingest(task_id, &video_path).await {
            Ok(stats) => {
                info!(
                    task_id = %task_id,
                    video_path = %video_path.display(),
                    indexed_count = stats.indexed,
                    skipped_count = stats.skipped,
                    "Ingestion complete"
                );
                self.progress
                    .publish(task_id, ProgressEvent::completed())
                    .await;
                self.tasks.set_state(task_id, TaskState::Completed).await;
            }
            Err(e) => {
                warn!(
                    task_id = %task_id,
                    video_path = %video_path.display(),
                    error = %e,
                    "Ingestion failed"
                );
                self.progress
                    .publish(task_id, ProgressEvent::failed(e.to_string()))
                    .await;
                self.tasks.set_state(task_id, TaskState::Failed).await;
            }
        }
    }

    async fn ingest(&self, task_id: Uuid, video_path: &Path) -> Result<IngestStats> {
        if !self.provider.health_check().await.unwrap_or(false) {
            return Err(Error::provider(
                DescriptionBackend::backend_name(self.provider.as_ref()),
                "backend unreachable before ingestion start",
            ));
        }

        let mut sampler =
            FrameSampler::open(video_path, &task_id.to_string(), &self.config.frames_dir).await?;
        let total = sampler.total_expected();

        let mut stats = IngestStats::default();
        loop {
            let frame = match sampler.next().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!(task_id = %task_id, error = %e, "Sampler error, ending run early");
                    break;
                }
            };

            match self.index_frame(task_id, video_path, &frame).await {
                Ok(()) => {
                    stats.indexed += 1;
                    self.progress
                        .publish(
                            task_id,
                            ProgressEvent::percent(progress_percent(stats.indexed, total)),
                        )
                        .await;
                }
                Err(e) if e.is_frame_recoverable() => {
                    stats.skipped += 1;
                    warn!(
                        task_id = %task_id,
                        frame_number = frame.frame_number,
                        error = %e,
                        "Skipping frame after per-frame failure"
                    );
                }
                Err(e) => return Err(e),
            }

            // Scheduling courtesy between frames, not a correctness need.
            tokio::task::yield_now().await;
        }

        stats.skipped += sampler.skipped();
        Ok(stats)
    }

    /// Describe, embed, and upsert one kept frame.
    async fn index_frame(
        &self,
        task_id: Uuid,
        video_path: &Path,
        frame: &SampledFrame,
    ) -> Result<()> {
        let description = self.provider.describe(&frame.jpeg, "image/jpeg").await?;
        let vector = self.provider.embed(&description).await?;

        let record = FrameRecord {
            task_id: task_id.to_string(),
            video_path: video_path.to_string_lossy().into_owned(),
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
            frame_path: frame.frame_path.clone(),
            description,
        };
        self.index
            .upsert(&record.embedding_id(), &vector, &record)
            .await
    }
}

/// `floor(indexed / total × 100)`, clamped into the progress range.
fn progress_percent(indexed: u64, total: u64) -> i32 {
    if total == 0 {
        return 100;
    }
    ((indexed * 100 / total) as i32).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidseq_index::LocalVectorIndex;
    use vidseq_inference::MockProvider;

    fn frame(n: u64) -> SampledFrame {
        SampledFrame {
            frame_number: n,
            timestamp: n as f64 * 2.0,
            frame_path: format!("frames/t1_frame_{}.jpg", n),
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    async fn orchestrator(
        dir: &Path,
        provider: Arc<MockProvider>,
    ) -> (IngestOrchestrator, Arc<ProgressRegistry>, Arc<TaskRegistry>) {
        let index = Arc::new(LocalVectorIndex::open(dir, 8).await.unwrap());
        let progress = Arc::new(ProgressRegistry::new());
        let tasks = Arc::new(TaskRegistry::new());
        let orchestrator = IngestOrchestrator::new(
            provider,
            index,
            progress.clone(),
            tasks.clone(),
            IngestConfig {
                frames_dir: dir.join("frames"),
            },
        );
        (orchestrator, progress, tasks)
    }

    #[test]
    fn progress_is_floor_of_percentage() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
    }

    #[test]
    fn progress_handles_degenerate_totals() {
        assert_eq!(progress_percent(0, 0), 100);
        // An underestimated total never pushes progress past 100.
        assert_eq!(progress_percent(7, 5), 100);
    }

    #[tokio::test]
    async fn index_frame_stores_description_and_vector() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new(8));
        let (orchestrator, _, _) = orchestrator(dir.path(), provider).await;

        let task_id = Uuid::new_v4();
        orchestrator
            .index_frame(task_id, Path::new("videos/demo.mp4"), &frame(0))
            .await
            .unwrap();

        // Query the index back through the same embedding to confirm the
        // record landed with its metadata intact.
        let vector = orchestrator
            .provider
            .embed("mock description of 4 image bytes")
            .await
            .unwrap();
        let matches = orchestrator.index.query(&vector, 1).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].record.frame_number, 0);
        assert_eq!(matches[0].record.task_id, task_id.to_string());
    }

    #[tokio::test]
    async fn index_frame_provider_failure_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new(8));
        provider.set_fail_describe(true);
        let (orchestrator, _, _) = orchestrator(dir.path(), provider).await;

        let err = orchestrator
            .index_frame(Uuid::new_v4(), Path::new("videos/demo.mp4"), &frame(0))
            .await
            .unwrap_err();
        assert!(err.is_frame_recoverable());
    }

    #[tokio::test]
    async fn missing_source_fails_task_with_minus_one() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(MockProvider::new(8));
        let (orchestrator, progress, tasks) = orchestrator(dir.path(), provider).await;

        let task_id = tasks.create(Some("missing.mp4".to_string())).await;
        let mut rx = progress.subscribe(task_id).await;

        orchestrator
            .run(task_id, PathBuf::from("/nonexistent/missing.mp4"))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.progress, -1);
        assert!(!event.error.is_empty());
        assert_eq!(tasks.get(task_id).await.unwrap().state, TaskState::Failed);
    }
}
