//! # vidseq-inference
//!
//! Description + embedding provider backends for vidseq. Both variants
//! implement the capability traits from `vidseq-core` and are selected once
//! per process:
//!
//! - [`RemoteProvider`]: hosted OpenAI-compatible vision chat and text
//!   embeddings (fixed 768-dimension output).
//! - [`LocalProvider`]: locally-hosted Ollama-style API; the embedding
//!   dimension is discovered from the first successful call.

pub mod local;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod prompt;
pub mod remote;

pub use local::LocalProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
pub use prompt::DESCRIPTION_PROMPT;
pub use remote::{RemoteProvider, RemoteProviderConfig};
