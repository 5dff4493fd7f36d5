//! Deterministic in-process provider for downstream tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use vidseq_core::{DescriptionBackend, EmbeddingBackend, Error, FrameAnalysisProvider, Result};

/// A provider whose outputs are pure functions of its inputs.
///
/// Descriptions echo the input length; embeddings are derived from a byte
/// checksum of the text, so equal texts embed identically and different
/// texts (almost always) differ.
pub struct MockProvider {
    dimension: usize,
    fail_describe: AtomicBool,
    fail_embed: AtomicBool,
}

impl MockProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_describe: AtomicBool::new(false),
            fail_embed: AtomicBool::new(false),
        }
    }

    /// Make every subsequent describe call fail with a provider error.
    pub fn set_fail_describe(&self, fail: bool) {
        self.fail_describe.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent embed call fail with a provider error.
    pub fn set_fail_embed(&self, fail: bool) {
        self.fail_embed.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DescriptionBackend for MockProvider {
    async fn describe(&self, image_data: &[u8], _mime_type: &str) -> Result<String> {
        if self.fail_describe.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "describe failure injected"));
        }
        Ok(format!("mock description of {} image bytes", image_data.len()))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl EmbeddingBackend for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail_embed.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "embed failure injected"));
        }
        let seed: u64 = text.bytes().map(u64::from).sum();
        Ok((0..self.dimension)
            .map(|i| (((seed + 31 * i as u64) % 97) as f32) / 97.0)
            .collect())
    }

    async fn dimension(&self) -> Result<usize> {
        Ok(self.dimension)
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl FrameAnalysisProvider for MockProvider {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
