//! LLM Rescorer (C9).
//!
//! Asks the model to judge, in one batched prompt, how well each of the
//! top reranked candidates matches the query description. Any failure —
//! no provider, network error, malformed output, or a deadline miss —
//! degrades every candidate's `llm_score` to `0.0` rather than failing
//! the match.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::llm::{extract_json_value, LlmProvider, LlmRequest};
use crate::types::Candidate;

/// Assign `llm_score` to every candidate in place, bounded by `deadline`.
pub async fn rescore(
    description: &str,
    year: i32,
    candidates: &mut [Candidate],
    llm: Option<&dyn LlmProvider>,
    temperature: f32,
    deadline: Duration,
) {
    if candidates.is_empty() {
        return;
    }

    let Some(provider) = llm else {
        zero_all(candidates);
        return;
    };

    let scores = match tokio::time::timeout(deadline, run(description, year, candidates, provider, temperature)).await
    {
        Ok(Some(scores)) => scores,
        Ok(None) | Err(_) => {
            zero_all(candidates);
            return;
        }
    };

    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.llm_score = scores.get(&index).copied().unwrap_or(0.0).clamp(0.0, 1.0);
    }
}

fn zero_all(candidates: &mut [Candidate]) {
    for candidate in candidates.iter_mut() {
        candidate.llm_score = 0.0;
    }
}

async fn run(
    description: &str,
    year: i32,
    candidates: &[Candidate],
    llm: &dyn LlmProvider,
    temperature: f32,
) -> Option<HashMap<usize, f32>> {
    let prompt = build_prompt(description, year, candidates);
    let request = LlmRequest::new(prompt, temperature);
    let response = llm.chat(&request).await.ok()?;
    let value = extract_json_value(&response.text)?;
    let array = value.as_array()?;

    let mut scores = HashMap::with_capacity(array.len());
    for entry in array {
        let index = entry.get("index").and_then(Value::as_u64)? as usize;
        let confidence = entry.get("confidence").and_then(Value::as_f64)? as f32;
        scores.insert(index, confidence);
    }
    Some(scores)
}

fn build_prompt(description: &str, year: i32, candidates: &[Candidate]) -> String {
    let mut listing = String::new();
    for (index, candidate) in candidates.iter().enumerate() {
        listing.push_str(&format!(
            "{index}: marca={}, submarca={}, tipveh={}, description=\"{}\"\n",
            candidate.marca, candidate.submarca, candidate.tipveh, candidate.descveh
        ));
    }

    format!(
        "Rate how well each candidate vehicle matches the query description for model year \
         {year}.\n\n\
         QUERY: \"{description}\"\n\n\
         CANDIDATES:\n{listing}\n\
         Return a JSON array with one entry per candidate: \
         [{{\"index\": 0, \"confidence\": 0.0}}, ...], confidence in [0, 1]. \
         Respond with JSON only."
    )
}
