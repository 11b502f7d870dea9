//! LLM Fallback (C6).
//!
//! Triggered when C5's tentative extraction is too weak to trust. Asks the
//! LLM to re-extract all three fields from a catalog-constrained prompt,
//! then verifies every returned value against the year's candidate sets
//! before accepting it — an LLM is never allowed to introduce a value the
//! catalog doesn't have.

use std::collections::HashSet;

use serde_json::Value;

use super::fuzzy::ratio;
use crate::catalog::CandidateIndex;
use crate::llm::{extract_json_value, LlmProvider, LlmRequest};
use crate::types::{ExtractedFields, ExtractionMethod, FieldConfidence};

const HIGH_CONFIDENCE_BAR: f32 = 0.8;
const CRITICAL_FIELD_BAR: f32 = 0.5;
const MEAN_QUALITY_BAR: f32 = 0.6;
const RECOVERY_RATIO: f32 = 0.9;
const TOP_MARCAS_IN_PROMPT: usize = 20;

/// Whether `fields` is weak enough to warrant consulting the LLM.
pub fn should_trigger(fields: &ExtractedFields) -> bool {
    let no_high_confidence = !fields.any_field_confident(HIGH_CONFIDENCE_BAR);
    let critical_missing =
        fields.marca.confidence < CRITICAL_FIELD_BAR && fields.submarca.confidence < CRITICAL_FIELD_BAR;
    let poor_mean = fields.mean_confidence() < MEAN_QUALITY_BAR;
    no_high_confidence || critical_missing || poor_mean
}

/// Apply the fallback if triggered; otherwise return `tentative` unchanged.
/// Any failure (no provider, network, timeout, malformed JSON) degrades to
/// the pre-fallback extraction, never an error.
pub async fn apply(
    description: &str,
    year: i32,
    index: &CandidateIndex,
    tentative: ExtractedFields,
    llm: Option<&dyn LlmProvider>,
    temperature: f32,
) -> ExtractedFields {
    if !should_trigger(&tentative) {
        return tentative;
    }
    let Some(provider) = llm else {
        return tentative;
    };

    match run(description, year, index, provider, temperature).await {
        Some(fields) => fields,
        None => tentative,
    }
}

async fn run(
    description: &str,
    year: i32,
    index: &CandidateIndex,
    llm: &dyn LlmProvider,
    temperature: f32,
) -> Option<ExtractedFields> {
    let prompt = build_prompt(description, year, index);
    let request = LlmRequest::new(prompt, temperature);
    let response = llm.chat(&request).await.ok()?;
    let value = extract_json_value(&response.text)?;

    Some(ExtractedFields {
        marca: parse_field(&value, "marca", &index.marca_set),
        submarca: parse_field(&value, "submarca", &index.submarca_set),
        tipveh: parse_field(&value, "tipveh", &index.tipveh_set),
        descveh: description.to_string(),
    })
}

fn parse_field(value: &Value, field_name: &str, candidates: &HashSet<String>) -> FieldConfidence {
    let Some(field_obj) = value.get(field_name) else {
        return FieldConfidence::none();
    };
    let Some(raw_value) = field_obj.get("value").and_then(Value::as_str) else {
        return FieldConfidence::none();
    };
    let confidence = field_obj
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.7) as f32;
    let confidence = confidence.clamp(0.7, 0.9);

    if candidates.contains(raw_value) {
        return FieldConfidence {
            value: Some(raw_value.to_string()),
            confidence,
            method: ExtractionMethod::LlmValidated,
        };
    }

    let recovered = candidates
        .iter()
        .map(|candidate| (candidate, ratio(raw_value, candidate)))
        .filter(|(_, score)| *score >= RECOVERY_RATIO)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then_with(|| b.0.cmp(a.0)));

    match recovered {
        Some((candidate, _)) => FieldConfidence {
            value: Some(candidate.clone()),
            confidence,
            method: ExtractionMethod::LlmCorrected,
        },
        None => FieldConfidence::none(),
    }
}

fn build_prompt(description: &str, year: i32, index: &CandidateIndex) -> String {
    let mut table = String::new();
    for (marca, freq) in index.top_marcas_by_frequency(TOP_MARCAS_IN_PROMPT) {
        let mut submarcas: Vec<(&String, &usize)> = freq.submarcas.iter().collect();
        submarcas.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let submarca_list = submarcas
            .iter()
            .map(|(name, count)| format!("{name} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut tipvehs: Vec<&String> = freq.tipvehs.iter().collect();
        tipvehs.sort();
        let tipveh_list = tipvehs
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        table.push_str(&format!("{marca} ({} total entries):\n", freq.total));
        if !submarca_list.is_empty() {
            table.push_str(&format!("  submarcas: {submarca_list}\n"));
        }
        if !tipveh_list.is_empty() {
            table.push_str(&format!("  tipvehs: {tipveh_list}\n"));
        }
    }

    format!(
        "Extract vehicle information from the following description using ONLY the catalog \
         options listed below.\n\n\
         DESCRIPTION: \"{description}\"\n\
         MODEL YEAR: {year}\n\n\
         CATALOG OPTIONS FOR {year} (marca -> submarcas -> tipvehs):\n{table}\n\
         INSTRUCTIONS:\n\
         1. Extract marca, submarca, and tipveh using ONLY values listed above.\n\
         2. Respect the hierarchy: a submarca must belong to the marca you chose.\n\
         3. If uncertain about a field, omit it.\n\
         4. Provide a confidence between 0.7 and 0.9 for each extracted field.\n\n\
         Respond with JSON only, in this exact shape:\n\
         {{\"marca\": {{\"value\": \"...\", \"confidence\": 0.85}}, \
         \"submarca\": {{\"value\": \"...\", \"confidence\": 0.8}}, \
         \"tipveh\": {{\"value\": \"...\", \"confidence\": 0.75}}}}"
    )
}
