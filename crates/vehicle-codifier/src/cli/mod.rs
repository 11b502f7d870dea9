//! CLI subcommands for the vehicle codifier demonstration harness.

pub mod batch;
pub mod config;
pub mod match_cmd;

use std::time::Duration;

use vehicle_codifier_core::{Config, EmbeddingProvider, LlmProvider, LlmProviderFactory};

use crate::catalog_source::CsvCatalogSource;

/// Build the optional LLM provider from config. Absence of a model
/// identifier or a failed provider construction both degrade to "no LLM" —
/// every stage that consults it already has a defined fallback.
pub fn build_llm_provider(config: &Config) -> Option<Box<dyn LlmProvider>> {
    if config.llm.llm_model_identifier.is_empty() {
        return None;
    }
    match LlmProviderFactory::create(&config.llm.llm_model_identifier, &config.llm) {
        Ok(provider) => Some(provider),
        Err(e) => {
            tracing::warn!("LLM provider unavailable, continuing without it: {e}");
            None
        }
    }
}

/// Build the embedding provider from config. The HTTP adapter is always
/// constructible (it only fails at call time), so this is infallible.
pub fn build_embedding_provider(config: &Config) -> Box<dyn EmbeddingProvider> {
    Box::new(vehicle_codifier_core::HttpEmbeddingProvider::new(
        &config.embedding.endpoint,
        config.embedding.dimension,
        config.limits.embed_timeout_ms,
    ))
}

/// Load the catalog cache from a CSV file at startup.
pub fn load_catalog(
    catalog_path: &std::path::Path,
    refresh_interval_secs: u64,
) -> anyhow::Result<vehicle_codifier_core::CatalogCache> {
    let source = Box::new(CsvCatalogSource::new(catalog_path));
    let cache = vehicle_codifier_core::CatalogCache::load(
        source,
        Duration::from_secs(refresh_interval_secs),
    )?;
    Ok(cache)
}
