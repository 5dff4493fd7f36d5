//! Application state: the provider/index pair selected once per process,
//! plus the owned registries shared across handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use vidseq_core::{
    defaults, EmbeddingBackend, Error, FrameAnalysisProvider, ProgressRegistry, Result,
    VectorIndex,
};
use vidseq_index::{LocalVectorIndex, RemoteVectorIndex};
use vidseq_inference::{LocalProvider, RemoteProvider};
use vidseq_ingest::{IngestConfig, IngestOrchestrator, TaskRegistry};
use vidseq_search::SearchPipeline;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn FrameAnalysisProvider>,
    pub progress: Arc<ProgressRegistry>,
    pub tasks: Arc<TaskRegistry>,
    pub orchestrator: Arc<IngestOrchestrator>,
    pub pipeline: Arc<SearchPipeline>,
    pub video_dir: PathBuf,
}

impl AppState {
    /// Build state from environment configuration.
    ///
    /// `VIDSEQ_PROVIDER` selects the backend pair: `"local"` (default) uses
    /// the local provider and the file-backed flat index; `"remote"` uses
    /// the hosted provider and the hosted index.
    pub async fn from_env() -> Result<Self> {
        let mode = std::env::var(defaults::ENV_PROVIDER).unwrap_or_else(|_| "local".to_string());

        let (provider, index): (Arc<dyn FrameAnalysisProvider>, Arc<dyn VectorIndex>) =
            match mode.as_str() {
                "local" => {
                    let provider = Arc::new(LocalProvider::from_env());

                    // The local index dimension comes from the provider's
                    // first successful embedding; when the service is not
                    // up yet, fall back to the default and let the loaded
                    // file pair override it if one exists.
                    let dimension = match provider.dimension().await {
                        Ok(d) => d,
                        Err(e) => {
                            warn!(
                                error = %e,
                                fallback = defaults::EMBED_DIMENSION,
                                "Could not discover embedding dimension at startup"
                            );
                            defaults::EMBED_DIMENSION
                        }
                    };

                    let index = Arc::new(
                        LocalVectorIndex::open(
                            &PathBuf::from(defaults::VECTOR_DB_DIR),
                            dimension,
                        )
                        .await?,
                    );
                    (provider, index)
                }
                "remote" => {
                    let provider = Arc::new(RemoteProvider::from_env());
                    let index = Arc::new(RemoteVectorIndex::from_env()?);
                    (provider, index)
                }
                other => {
                    return Err(Error::Config(format!(
                        "unknown {} value: {} (expected \"remote\" or \"local\")",
                        defaults::ENV_PROVIDER,
                        other
                    )))
                }
            };

        info!(mode = %mode, "Backend pair selected");

        let progress = Arc::new(ProgressRegistry::new());
        let tasks = Arc::new(TaskRegistry::new());

        let orchestrator = Arc::new(IngestOrchestrator::new(
            provider.clone(),
            index.clone(),
            progress.clone(),
            tasks.clone(),
            IngestConfig::default(),
        ));
        let pipeline = Arc::new(SearchPipeline::new(
            provider.clone(),
            index,
            progress.clone(),
        ));

        Ok(Self {
            provider,
            progress,
            tasks,
            orchestrator,
            pipeline,
            video_dir: PathBuf::from(defaults::VIDEO_DIR),
        })
    }
}
