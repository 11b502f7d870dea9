//! Pipeline orchestrator (C11) — wires every stage into one state machine.
//!
//! PREPROCESS → EXTRACT → FILTER → (FALLBACK) → FUZZY → EMBED_RERANK →
//! LLM_RESCORE → MIX_DECIDE → DONE. Each stage after FILTER is skipped when
//! the candidate list is already empty; the whole run is bounded by
//! `config.limits.match_deadline_ms`, after which the remaining stages are
//! skipped and whatever scores exist are mixed as-is.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::catalog::{CandidateIndexCache, CatalogCache};
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::PipelineError;
use crate::extraction;
use crate::filter::filter_candidates;
use crate::llm::LlmProvider;
use crate::mixer::mix_and_decide;
use crate::normalize::normalize;
use crate::preprocess::Preprocessor;
use crate::rerank::{embedding_pass, fuzzy_pass};
use crate::rescorer::rescore;
use crate::types::{Diagnostics, MatchResult};

/// Holds the long-lived collaborators a match needs: the catalog cache, its
/// derived-index cache, and the optional LLM/embedding backends. Built once
/// by the caller and reused across requests.
pub struct Orchestrator<'a> {
    config: &'a Config,
    catalog: &'a CatalogCache,
    index_cache: &'a CandidateIndexCache,
    llm: Option<&'a dyn LlmProvider>,
    embedder: Option<&'a dyn EmbeddingProvider>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        catalog: &'a CatalogCache,
        index_cache: &'a CandidateIndexCache,
        llm: Option<&'a dyn LlmProvider>,
        embedder: Option<&'a dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            config,
            catalog,
            index_cache,
            llm,
            embedder,
        }
    }

    /// Run the full pipeline for one already-preprocessed `(year,
    /// description)` pair.
    pub async fn match_vehicle(&self, year: i32, description: &str) -> MatchResult {
        let start = Instant::now();
        let deadline = Duration::from_millis(self.config.limits.match_deadline_ms);
        let mut stages_run = Vec::new();
        let mut notes = Vec::new();

        stages_run.push("preprocess".to_string());
        let description = normalize(description);
        let description = description.as_str();

        let snapshot = self.catalog.active_snapshot();
        let index = self.index_cache.get_or_build(&snapshot, year);

        stages_run.push("extract".to_string());
        let extracted = extraction::extract(
            description,
            year,
            &index,
            self.llm,
            self.config.llm.llm_temperature,
        )
        .await;
        if extraction::should_trigger_fallback(&extracted) && self.llm.is_none() {
            notes.push("llm fallback skipped: no provider configured".to_string());
        }

        stages_run.push("filter".to_string());
        let fallback_triggered = extracted.marca.value.is_none() && extracted.submarca.value.is_none();
        let mut candidates = filter_candidates(&snapshot, year, &extracted);
        if fallback_triggered {
            stages_run.push("fallback".to_string());
        }

        if candidates.is_empty() {
            return self.finish(
                extracted,
                Vec::new(),
                start,
                stages_run,
                fallback_triggered,
                notes,
            );
        }

        if start.elapsed() >= deadline {
            notes.push("deadline elapsed before rerank; scoring with filter-only signals".to_string());
            return self.finish(
                extracted,
                candidates,
                start,
                stages_run,
                fallback_triggered,
                notes,
            );
        }

        stages_run.push("fuzzy".to_string());
        fuzzy_pass::score(description, &mut candidates);

        if start.elapsed() >= deadline {
            notes.push("deadline elapsed before embedding rerank".to_string());
            return self.finish(
                extracted,
                candidates,
                start,
                stages_run,
                fallback_triggered,
                notes,
            );
        }

        stages_run.push("embed_rerank".to_string());
        candidates = embedding_pass::score_and_truncate(
            description,
            candidates,
            self.embedder,
            self.config.rerank.top_n_rerank,
        )
        .await;

        let remaining = deadline.checked_sub(start.elapsed()).unwrap_or(Duration::ZERO);
        if remaining.is_zero() {
            notes.push("deadline elapsed before LLM rescoring".to_string());
        } else {
            stages_run.push("llm_rescore".to_string());
            rescore(
                description,
                year,
                &mut candidates,
                self.llm,
                self.config.llm.llm_temperature,
                remaining,
            )
            .await;
        }

        self.finish(extracted, candidates, start, stages_run, fallback_triggered, notes)
    }

    /// Preprocess a single record or `{row_id -> record}` batch, then run
    /// `match_vehicle` over every row. Rows the preprocessor drops (no
    /// plausible year/description) are absent from the result map.
    pub async fn match_batch(
        &self,
        input: &Value,
    ) -> Result<HashMap<String, MatchResult>, PipelineError> {
        let preprocessor = Preprocessor::new(self.config);
        let rows = preprocessor.process(input, self.llm).await?;

        let mut results = HashMap::with_capacity(rows.len());
        for (row_id, row) in rows {
            let result = self.match_vehicle(row.year, &row.description).await;
            results.insert(row_id, result);
        }
        Ok(results)
    }

    fn finish(
        &self,
        extracted: crate::types::ExtractedFields,
        candidates: Vec<crate::types::Candidate>,
        start: Instant,
        mut stages_run: Vec<String>,
        fallback_triggered: bool,
        notes: Vec<String>,
    ) -> MatchResult {
        stages_run.push("mix_decide".to_string());
        let mix = mix_and_decide(
            candidates,
            &self.config.weights,
            &self.config.thresholds,
            &self.config.review,
        );
        stages_run.push("done".to_string());

        let diagnostics = if self.config.output.debug {
            Some(Diagnostics {
                stages_run,
                fallback_triggered: fallback_triggered.then(|| "field_extraction".to_string()),
                recommendation: Some(recommendation_for(&mix.decision, mix.confidence)),
                notes,
            })
        } else {
            None
        };

        MatchResult {
            decision: mix.decision,
            suggested_cvegs: mix.suggested_cvegs,
            confidence: mix.confidence,
            extracted_fields: extracted,
            top_candidates: mix.review_candidates,
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            diagnostics,
        }
    }
}

fn recommendation_for(decision: &crate::types::Decision, confidence: f32) -> String {
    use crate::types::Decision::*;
    match decision {
        AutoAccept => format!("Accept suggested CVEGS automatically (confidence {confidence:.2})."),
        NeedsReview => format!(
            "Confidence {confidence:.2} falls between thresholds; route to a human reviewer."
        ),
        NoMatch => "No candidate cleared the minimum confidence; request more detail or manual codification.".to_string(),
    }
}
