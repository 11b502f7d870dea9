//! Field extraction: the catalog-driven matcher (C5) plus its LLM fallback
//! (C6). `extract` runs both in sequence, exactly as the orchestrator needs.

pub mod fields;
pub mod fuzzy;
pub mod llm_fallback;

pub use fields::extract_fields;
pub use llm_fallback::should_trigger as should_trigger_fallback;

use crate::catalog::CandidateIndex;
use crate::llm::LlmProvider;
use crate::types::ExtractedFields;

/// Run C5, then C6 if C5's result is weak enough to warrant it.
pub async fn extract(
    description: &str,
    year: i32,
    index: &CandidateIndex,
    llm: Option<&dyn LlmProvider>,
    llm_temperature: f32,
) -> ExtractedFields {
    let tentative = fields::extract_fields(description, index);
    llm_fallback::apply(description, year, index, tentative, llm, llm_temperature).await
}
