//! Vehicle codifier core — the CVEGS vehicle codification pipeline.
//!
//! Takes a raw `(year, free-text description)` pair (or a batch of them, in
//! arbitrary input shape) and runs it through catalog-constrained field
//! extraction, progressive filtering, fuzzy/embedding/LLM reranking, and a
//! weighted score mixer, producing a suggested catalog row and a decision:
//!
//! ```text
//! Input → Preprocess → Extract → Filter → Rerank (fuzzy, embedding, LLM) → Mix & Decide
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vehicle_codifier_core::{CandidateIndexCache, CatalogCache, Config, Orchestrator};
//!
//! # async fn run(catalog: CatalogCache) -> vehicle_codifier_core::Result<()> {
//! let config = Config::load()?;
//! let index_cache = CandidateIndexCache::new();
//! let orchestrator = Orchestrator::new(&config, &catalog, &index_cache, None, None);
//! let result = orchestrator.match_vehicle(2022, "toyota yaris sol l").await;
//! println!("{:?}", result.decision);
//! # Ok(())
//! # }
//! ```

// Module declarations — public modules have re-exported consumer types
pub mod catalog;
pub mod config;
pub(crate) mod embedding;
pub mod error;
pub mod extraction;
pub mod filter;
pub(crate) mod llm;
pub(crate) mod math;
pub mod mixer;
pub(crate) mod normalize;
pub mod orchestrator;
pub(crate) mod output;
pub mod preprocess;
pub(crate) mod rerank;
pub(crate) mod rescorer;
pub mod types;

// Re-exports for convenient access
pub use catalog::{CandidateIndex, CandidateIndexCache, CatalogCache, CatalogSnapshot, CatalogSource};
pub use config::Config;
pub use embedding::{EmbeddingProvider, HttpEmbeddingProvider};
pub use error::{CodifierError, ConfigError, PipelineError, PipelineResult, Result};
pub use extraction::extract as extract_fields;
pub use llm::{LlmProvider, LlmProviderFactory};
pub use mixer::{mix_and_decide, MixResult};
pub use normalize::normalize;
pub use orchestrator::Orchestrator;
pub use output::{OutputFormat, OutputWriter};
pub use preprocess::{PreprocessedBatch, PreprocessedRow, Preprocessor};
pub use types::{
    Candidate, CatalogRecord, Decision, Diagnostics, ExtractedFields, ExtractionMethod,
    FieldConfidence, MatchQuality, MatchResult,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
