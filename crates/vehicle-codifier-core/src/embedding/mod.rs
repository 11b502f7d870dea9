//! Dense embedding generation for the reranker's Pass B (C8B).
//!
//! The core never trains or hosts an embedding model itself (spec.md
//! Non-goals); it calls out to an external `embed(text) -> vector` service
//! through the `EmbeddingProvider` trait, mirroring the `LlmProvider`
//! object-safety pattern in `llm::provider`.

pub mod http;

use crate::error::PipelineError;
use async_trait::async_trait;

/// Trait implemented by embedding backends. Object-safe so the orchestrator
/// can hold a `Box<dyn EmbeddingProvider>` without knowing the concrete
/// transport.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text, returning an L2-normalized vector of
    /// the provider's fixed dimension.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;

    /// Expected embedding dimension, used to validate catalog records at
    /// load time.
    fn dimension(&self) -> usize;
}

pub use http::HttpEmbeddingProvider;
