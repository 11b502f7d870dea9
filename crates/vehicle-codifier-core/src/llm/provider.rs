//! LLM provider trait and request/response types.
//!
//! Defines the text-chat interface all LLM providers implement (C4 field
//! discovery, C6 fallback extraction, and C9 rescoring all go through this
//! one trait), plus the factory that creates the right provider from config.

use crate::config::LlmConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use std::time::Duration;

/// A request to the LLM chat endpoint.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Full prompt text, including any catalog-constrained context.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature,
        }
    }
}

/// The response from an LLM chat call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Raw generated text. Callers are responsible for extracting a JSON
    /// substring per spec.md §6 ("the core parses JSON substrings from the
    /// response; any deviation is treated as failure").
    pub text: String,
    /// Model identifier used.
    pub model: String,
    /// Number of tokens used (input + output), if reported.
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds.
    pub latency_ms: u64,
}

/// Trait that all LLM providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "anthropic", "ollama").
    fn name(&self) -> &str;

    /// Check whether the provider is configured and reachable. Does not
    /// make a network call; callers that need a true reachability probe
    /// should attempt a `chat` call with a short deadline instead.
    async fn is_available(&self) -> bool;

    /// Send a chat completion request.
    async fn chat(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the appropriate provider from a `provider:model`
/// identifier (e.g. `"anthropic:claude-sonnet-4-20250514"`) and config.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a provider from a model identifier and the LLM config section.
    /// The identifier's prefix before `:` selects the provider; everything
    /// after overrides the provider's configured model name.
    pub fn create(
        model_identifier: &str,
        config: &LlmConfig,
    ) -> Result<Box<dyn LlmProvider>, PipelineError> {
        let (provider, model_override) = match model_identifier.split_once(':') {
            Some((p, m)) => (p, Some(m)),
            None => (model_identifier, None),
        };
        Self::create_with_override(provider, config, model_override)
    }

    fn create_with_override(
        provider: &str,
        config: &LlmConfig,
        model_override: Option<&str>,
    ) -> Result<Box<dyn LlmProvider>, PipelineError> {
        match provider {
            "ollama" => {
                let cfg = config.ollama.clone().unwrap_or_default();
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(super::ollama::OllamaProvider::new(
                    &cfg.endpoint,
                    &model,
                )))
            }
            "anthropic" => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    PipelineError::LlmUnavailable {
                        stage: "provider_init".to_string(),
                        message: "Anthropic API key not set. Set ANTHROPIC_API_KEY env var."
                            .to_string(),
                        status_code: None,
                    }
                })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(super::anthropic::AnthropicProvider::new(
                    &api_key, &model,
                )))
            }
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    PipelineError::LlmUnavailable {
                        stage: "provider_init".to_string(),
                        message: "OpenAI API key not set. Set OPENAI_API_KEY env var."
                            .to_string(),
                        status_code: None,
                    }
                })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(super::openai::OpenAiProvider::new(&api_key, &model)))
            }
            other => Err(PipelineError::LlmUnavailable {
                stage: "provider_init".to_string(),
                message: format!("unknown LLM provider: {other}"),
                status_code: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_env_var() {
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        assert_eq!(resolve_env_var(""), None);
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }

    #[test]
    fn test_factory_rejects_unknown_provider() {
        let config = LlmConfig::default();
        let err = LlmProviderFactory::create("carrier-pigeon", &config).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_factory_splits_model_identifier() {
        let mut config = LlmConfig::default();
        config.ollama = Some(crate::config::OllamaConfig {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        });
        let provider = LlmProviderFactory::create("ollama:llama3.2-custom", &config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_llm_request_defaults() {
        let request = LlmRequest::new("hello", 0.05);
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.temperature, 0.05);
    }
}
