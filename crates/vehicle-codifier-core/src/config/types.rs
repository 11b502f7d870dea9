//! Sub-configuration structs with defaults matching spec.md §6.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalog cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Automatic refresh interval in seconds. Default 24h.
    pub refresh_interval_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 24 * 60 * 60,
        }
    }
}

/// Field extraction thresholds (C5/C6/C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// τ_hc — confidence at/above which a filter clause is added for a field.
    pub high_confidence_threshold: f32,
    /// Stage B fuzzy acceptance threshold.
    pub fuzzy_accept_threshold: f32,
    /// Earliest model year accepted by the preprocessor's year-field scorer.
    pub min_vehicle_year: i32,
    /// How many years past the current year are still considered valid.
    pub future_years_ahead: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            high_confidence_threshold: 0.9,
            fuzzy_accept_threshold: 0.8,
            min_vehicle_year: 1950,
            future_years_ahead: 5,
        }
    }
}

/// Score mixer weights (C10). Must sum to 1.0 within a small tolerance;
/// enforced by `Config::validate`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub filter: f32,
    pub fuzzy: f32,
    pub similarity: f32,
    pub llm: f32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            filter: 0.25,
            fuzzy: 0.20,
            similarity: 0.25,
            llm: 0.30,
        }
    }
}

impl WeightsConfig {
    pub fn sum(&self) -> f32 {
        self.filter + self.fuzzy + self.similarity + self.llm
    }
}

/// A `(high, low)` threshold pair used by the decision stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub high: f32,
    pub low: f32,
}

/// Type-dependent decision thresholds, keyed by vehicle-type category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub passenger: ThresholdPair,
    pub commercial: ThresholdPair,
    pub motorcycle: ThresholdPair,
    pub default: ThresholdPair,
    /// Additional `tipveh → category` overrides beyond the built-in keyword
    /// lists in `mixer.rs`.
    pub category_overrides: HashMap<String, String>,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            passenger: ThresholdPair { high: 0.90, low: 0.70 },
            commercial: ThresholdPair { high: 0.75, low: 0.55 },
            motorcycle: ThresholdPair { high: 0.85, low: 0.65 },
            default: ThresholdPair { high: 0.80, low: 0.60 },
            category_overrides: HashMap::new(),
        }
    }
}

/// Reranker settings (C8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// How many top candidates (by similarity_score) carry forward to C9.
    pub top_n_rerank: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self { top_n_rerank: 20 }
    }
}

/// Review-list sizing and no-match behavior (C10).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub auto_accept_list_size: usize,
    pub needs_review_list_size: usize,
    pub no_match_list_size: usize,
    /// Whether the review list is populated when decision is `no_match`.
    pub return_candidates_on_no_match: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            auto_accept_list_size: 3,
            needs_review_list_size: 3,
            no_match_list_size: 5,
            return_candidates_on_no_match: true,
        }
    }
}

/// Timeouts and deadlines (§5 Concurrency & Resource Model).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-call LLM timeout in milliseconds.
    pub llm_timeout_ms: u64,
    /// Per-call embedding service timeout in milliseconds.
    pub embed_timeout_ms: u64,
    /// Total wall-clock budget for a single `match_vehicle` call.
    pub match_deadline_ms: u64,
    /// Total wall-clock budget for a batch job (enforced by callers, not the core).
    pub batch_deadline_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: 8_000,
            embed_timeout_ms: 5_000,
            match_deadline_ms: 10_000,
            batch_deadline_ms: 10 * 60 * 1000,
        }
    }
}

/// Dense embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// HTTP endpoint implementing `embed(text) -> vector`.
    pub endpoint: String,
    /// Expected embedding dimension.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/embed".to_string(),
            dimension: 384,
        }
    }
}

/// Output settings for the CLI harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl").
    pub format: String,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Include embedding vectors on candidates in output.
    pub include_embedding: bool,
    /// Include the `diagnostics` block on every result.
    pub debug: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
            include_embedding: false,
            debug: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LLM provider configurations. One chat-completion endpoint is chosen at
/// startup by `llm_model_identifier`'s provider prefix (see `llm::provider`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider-qualified model identifier, e.g. `"anthropic:claude-sonnet-4-20250514"`.
    pub llm_model_identifier: String,
    /// Sampling temperature used for extraction/rescoring prompts.
    pub llm_temperature: f32,

    pub ollama: Option<OllamaConfig>,
    pub anthropic: Option<AnthropicConfig>,
    pub openai: Option<OpenAiConfig>,
}

/// Ollama (local) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (supports `${ENV_VAR}` syntax).
    pub api_key: String,
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (supports `${ENV_VAR}` syntax).
    pub api_key: String,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}
