//! Remote vector index: a hosted similarity index behind a JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use vidseq_core::defaults;
use vidseq_core::{Error, FrameMatch, FrameRecord, Result, VectorIndex};

/// Request timeout for index calls (seconds).
const INDEX_TIMEOUT_SECS: u64 = 30;

/// Hosted vector index client.
///
/// The service owns durability and concurrency; this client performs one
/// upsert per frame and top-k queries with metadata included.
pub struct RemoteVectorIndex {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteVectorIndex {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        info!(base_url = %base_url, "Initializing remote vector index");
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Create from environment variables. The index URL is required in
    /// remote mode.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(defaults::ENV_INDEX_URL).map_err(|_| {
            Error::Config(format!("{} must be set in remote mode", defaults::ENV_INDEX_URL))
        })?;
        let api_key = std::env::var(defaults::ENV_INDEX_API_KEY).ok();
        Ok(Self::new(base_url, api_key))
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url).timeout(Duration::from_secs(INDEX_TIMEOUT_SECS));
        if let Some(ref api_key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<UpsertVector>,
}

#[derive(Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: JsonValue,
}

#[derive(Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    metadata: JsonValue,
}

// =============================================================================
// TRAIT IMPL
// =============================================================================

#[async_trait]
impl VectorIndex for RemoteVectorIndex {
    async fn upsert(&self, id: &str, vector: &[f32], metadata: &FrameRecord) -> Result<()> {
        let request = UpsertRequest {
            vectors: vec![UpsertVector {
                id: id.to_string(),
                values: vector.to_vec(),
                metadata: serde_json::to_value(metadata)?,
            }],
        };

        let response = self
            .build_request("/vectors/upsert")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Index(format!("upsert request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Index(format!("upsert returned {}: {}", status, body)));
        }

        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<FrameMatch>> {
        let request = QueryRequest {
            vector: vector.to_vec(),
            top_k: k,
            include_metadata: true,
        };

        let response = self
            .build_request("/query")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Index(format!("query request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Index(format!("query returned {}: {}", status, body)));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::Index(format!("unparseable query response: {}", e)))?;

        let matches = result
            .matches
            .into_iter()
            .map(|m| {
                let record: FrameRecord = serde_json::from_value(m.metadata)
                    .map_err(|e| Error::Index(format!("bad match metadata: {}", e)))?;
                Ok(FrameMatch {
                    record,
                    score: m.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(result_count = matches.len(), "Remote index query complete");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_request_serialization() {
        let request = UpsertRequest {
            vectors: vec![UpsertVector {
                id: "t1_frame_0".to_string(),
                values: vec![0.5, 0.5],
                metadata: serde_json::json!({"frame_number": 0}),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["vectors"][0]["id"], "t1_frame_0");
        assert_eq!(json["vectors"][0]["values"][1], 0.5);
    }

    #[test]
    fn query_response_tolerates_missing_matches() {
        let resp: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.matches.is_empty());
    }
}
