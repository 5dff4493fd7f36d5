//! Remote provider: hosted OpenAI-compatible vision chat + text embeddings.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vidseq_core::defaults;
use vidseq_core::{DescriptionBackend, EmbeddingBackend, Error, FrameAnalysisProvider, Result};

use crate::prompt::DESCRIPTION_PROMPT;

const BACKEND_NAME: &str = "remote";

/// Configuration for the remote provider.
#[derive(Debug, Clone)]
pub struct RemoteProviderConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Bearer token; optional for self-hosted compatible endpoints.
    pub api_key: Option<String>,
    /// Vision-capable chat model used for frame description.
    pub vision_model: String,
    /// Text-embedding model.
    pub embed_model: String,
    /// Embedding dimension; must match the remote vector index.
    pub dimension: usize,
    /// Timeout for description requests (seconds).
    pub describe_timeout_secs: u64,
    /// Timeout for embedding requests (seconds).
    pub embed_timeout_secs: u64,
}

impl Default for RemoteProviderConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::REMOTE_BASE_URL.to_string(),
            api_key: None,
            vision_model: defaults::REMOTE_VISION_MODEL.to_string(),
            embed_model: defaults::REMOTE_EMBED_MODEL.to_string(),
            dimension: defaults::EMBED_DIMENSION,
            describe_timeout_secs: defaults::DESCRIBE_TIMEOUT_SECS,
            embed_timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }
}

/// Hosted description + embedding provider.
pub struct RemoteProvider {
    client: Client,
    config: RemoteProviderConfig,
}

impl RemoteProvider {
    pub fn new(config: RemoteProviderConfig) -> Self {
        info!(
            base_url = %config.base_url,
            vision_model = %config.vision_model,
            embed_model = %config.embed_model,
            dimension = config.dimension,
            "Initializing remote provider"
        );
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let config = RemoteProviderConfig {
            base_url: std::env::var(defaults::ENV_REMOTE_BASE_URL)
                .unwrap_or_else(|_| defaults::REMOTE_BASE_URL.to_string()),
            api_key: std::env::var(defaults::ENV_REMOTE_API_KEY).ok(),
            vision_model: std::env::var(defaults::ENV_REMOTE_VISION_MODEL)
                .unwrap_or_else(|_| defaults::REMOTE_VISION_MODEL.to_string()),
            embed_model: std::env::var(defaults::ENV_REMOTE_EMBED_MODEL)
                .unwrap_or_else(|_| defaults::REMOTE_EMBED_MODEL.to_string()),
            ..Default::default()
        };
        Self::new(config)
    }

    pub fn config(&self) -> &RemoteProviderConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<VisionMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct VisionMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    /// Requested output dimension; pins the model to the index dimension.
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

// =============================================================================
// TRAIT IMPLS
// =============================================================================

#[async_trait]
impl DescriptionBackend for RemoteProvider {
    async fn describe(&self, image_data: &[u8], mime_type: &str) -> Result<String> {
        let start = Instant::now();
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = ChatCompletionRequest {
            model: self.config.vision_model.clone(),
            messages: vec![VisionMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: DESCRIPTION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{}", mime_type, image_b64),
                        },
                    },
                ],
            }],
            max_tokens: 1024,
        };

        let response = self
            .build_request("/chat/completions")
            .timeout(Duration::from_secs(self.config.describe_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::provider(BACKEND_NAME, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(
                BACKEND_NAME,
                format!("describe returned {}: {}", status, body),
            ));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(BACKEND_NAME, format!("unparseable describe response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::provider(BACKEND_NAME, "describe response had no choices"))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            model = %self.config.vision_model,
            response_len = content.len(),
            duration_ms = elapsed,
            "Frame described"
        );
        if elapsed > 30_000 {
            warn!(duration_ms = elapsed, slow = true, "Slow describe operation");
        }

        Ok(content)
    }

    fn backend_name(&self) -> &str {
        BACKEND_NAME
    }
}

#[async_trait]
impl EmbeddingBackend for RemoteProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: vec![text.to_string()],
            dimensions: self.config.dimension,
        };

        let response = self
            .build_request("/embeddings")
            .timeout(Duration::from_secs(self.config.embed_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::provider(BACKEND_NAME, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(
                BACKEND_NAME,
                format!("embed returned {}: {}", status, body),
            ));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(BACKEND_NAME, format!("unparseable embed response: {}", e)))?;

        let vector = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::provider(BACKEND_NAME, "embed response had no data"))?;

        if vector.len() != self.config.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }

    async fn dimension(&self) -> Result<usize> {
        Ok(self.config.dimension)
    }

    fn backend_name(&self) -> &str {
        BACKEND_NAME
    }
}

#[async_trait]
impl FrameAnalysisProvider for RemoteProvider {
    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let mut req = self.client.get(&url).timeout(Duration::from_secs(5));
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        match req.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
