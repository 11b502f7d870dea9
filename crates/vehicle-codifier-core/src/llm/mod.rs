//! LLM integration for catalog-constrained text extraction and rescoring.
//!
//! Provides a provider abstraction over multiple chat backends (Ollama,
//! Anthropic, OpenAI) used by C4's field-pattern discovery, C6's fallback
//! extraction, and C9's rescoring — all three are catalog-constrained
//! single-prompt calls, never a long-running agent.

pub mod anthropic;
pub mod json_extract;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod retry;

pub use json_extract::extract_json_value;
pub use provider::{LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse};
