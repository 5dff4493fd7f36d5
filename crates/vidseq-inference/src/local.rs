//! Local provider: Ollama-style HTTP API for vision description and
//! embeddings.
//!
//! The describe path requests a single non-streamed completion but must
//! tolerate servers that stream newline-delimited JSON fragments anyway:
//! the `response` field of every well-formed line is concatenated, and the
//! call fails with `MalformedProviderResponse` only when no line parses.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use vidseq_core::defaults;
use vidseq_core::{DescriptionBackend, EmbeddingBackend, Error, FrameAnalysisProvider, Result};

use crate::prompt::DESCRIPTION_PROMPT;

const BACKEND_NAME: &str = "ollama";

/// Locally-hosted description + embedding provider.
pub struct LocalProvider {
    client: Client,
    base_url: String,
    vision_model: String,
    embed_model: String,
    /// Embedding dimension, discovered from the first successful embed call.
    discovered_dimension: OnceCell<usize>,
    describe_timeout_secs: u64,
    embed_timeout_secs: u64,
}

impl LocalProvider {
    pub fn new(base_url: String, vision_model: String, embed_model: String) -> Self {
        info!(
            base_url = %base_url,
            vision_model = %vision_model,
            embed_model = %embed_model,
            "Initializing local provider"
        );
        Self {
            client: Client::new(),
            base_url,
            vision_model,
            embed_model,
            discovered_dimension: OnceCell::new(),
            describe_timeout_secs: defaults::DESCRIBE_TIMEOUT_SECS,
            embed_timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_OLLAMA_BASE)
            .unwrap_or_else(|_| defaults::OLLAMA_URL.to_string());
        let vision_model = std::env::var(defaults::ENV_LOCAL_VISION_MODEL)
            .unwrap_or_else(|_| defaults::LOCAL_VISION_MODEL.to_string());
        let embed_model = std::env::var(defaults::ENV_LOCAL_EMBED_MODEL)
            .unwrap_or_else(|_| defaults::LOCAL_EMBED_MODEL.to_string());
        Self::new(base_url, vision_model, embed_model)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>, // base64 encoded
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Parse a `/api/generate` body that may be a single JSON object or a
/// stream of newline-delimited JSON fragments.
fn parse_generate_body(body: &str) -> Result<String> {
    if let Ok(single) = serde_json::from_str::<GenerateResponse>(body) {
        return Ok(single.response);
    }

    let mut parsed_any = false;
    let mut combined = String::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(fragment) = serde_json::from_str::<GenerateResponse>(line) {
            parsed_any = true;
            combined.push_str(&fragment.response);
        }
    }

    if parsed_any {
        Ok(combined)
    } else {
        Err(Error::MalformedProviderResponse(format!(
            "no parseable line in generate response ({} bytes)",
            body.len()
        )))
    }
}

// =============================================================================
// TRAIT IMPLS
// =============================================================================

#[async_trait]
impl DescriptionBackend for LocalProvider {
    async fn describe(&self, image_data: &[u8], _mime_type: &str) -> Result<String> {
        let start = Instant::now();
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = GenerateRequest {
            model: self.vision_model.clone(),
            prompt: DESCRIPTION_PROMPT.to_string(),
            images: vec![image_b64],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(Duration::from_secs(self.describe_timeout_secs))
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

        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(BACKEND_NAME, e))?;
        let content = parse_generate_body(&body)?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            model = %self.vision_model,
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
impl EmbeddingBackend for LocalProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: self.embed_model.clone(),
            input: vec![text.to_string()],
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .timeout(Duration::from_secs(self.embed_timeout_secs))
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

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(BACKEND_NAME, format!("unparseable embed response: {}", e)))?;

        let vector = result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider(BACKEND_NAME, "embed response had no embeddings"))?;

        let dimension = vector.len();
        let known = *self.discovered_dimension.get_or_init(|| async { dimension }).await;
        if dimension != known {
            return Err(Error::DimensionMismatch {
                expected: known,
                actual: dimension,
            });
        }

        Ok(vector)
    }

    /// Discovered from the first successful embedding call; performs that
    /// call if none has happened yet.
    async fn dimension(&self) -> Result<usize> {
        if let Some(d) = self.discovered_dimension.get() {
            return Ok(*d);
        }
        let probe = self.embed("dimension probe").await?;
        Ok(probe.len())
    }

    fn backend_name(&self) -> &str {
        BACKEND_NAME
    }
}

#[async_trait]
impl FrameAnalysisProvider for LocalProvider {
    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
