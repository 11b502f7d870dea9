//! Field Extractor (C5) — the principal algorithm.
//!
//! Extracts `marca`, `submarca`, and `tipveh` from a normalized description
//! against the year-scoped candidate index, in that priority order, trimming
//! the working text as high-confidence fields are found so later fields
//! aren't confused by already-matched substrings.

use std::collections::HashSet;

use super::fuzzy::{partial_ratio, token_sort_ratio};
use crate::catalog::CandidateIndex;
use crate::types::{ExtractedFields, ExtractionMethod, FieldConfidence};

const STAGE_A_CONFIDENCE: f32 = 1.0;
const TRIM_THRESHOLD: f32 = 0.9;
const HIGH_FUZZY: f32 = 0.8;
const MEDIUM_FUZZY: f32 = 0.6;
const LOW_FUZZY: f32 = 0.4;

/// Run the field-match procedure for one field against one candidate set.
pub fn extract_field(description: &str, candidates: &HashSet<String>) -> FieldConfidence {
    if candidates.is_empty() {
        return FieldConfidence::none();
    }

    // Stage A: direct substring match, longest candidate first; ties broken
    // lexicographically for determinism.
    let mut by_length: Vec<&String> = candidates.iter().collect();
    by_length.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    for candidate in &by_length {
        if description.contains(candidate.as_str()) {
            return FieldConfidence {
                value: Some((*candidate).clone()),
                confidence: STAGE_A_CONFIDENCE,
                method: ExtractionMethod::Direct,
            };
        }
    }

    // Stage B: fuzzy match. Iterate in lexicographic order and require a
    // strict improvement, so the first candidate in that order wins ties.
    let mut by_name: Vec<&String> = candidates.iter().collect();
    by_name.sort();

    let mut best_score = 0.0f32;
    let mut best_candidate: Option<&String> = None;
    let mut best_method = ExtractionMethod::None;

    for candidate in by_name {
        let partial = partial_ratio(description, candidate);
        let token = token_sort_ratio(description, candidate);

        if partial > best_score {
            best_score = partial;
            best_candidate = Some(candidate);
            best_method = ExtractionMethod::FuzzyPartial;
        }
        if token > best_score {
            best_score = token;
            best_candidate = Some(candidate);
            best_method = ExtractionMethod::FuzzyToken;
        }
    }

    match best_score {
        s if s >= HIGH_FUZZY => FieldConfidence {
            value: best_candidate.cloned(),
            confidence: s.min(0.95),
            method: best_method,
        },
        s if s >= MEDIUM_FUZZY => FieldConfidence {
            value: best_candidate.cloned(),
            confidence: s * 0.8,
            method: best_method,
        },
        s if s >= LOW_FUZZY => FieldConfidence {
            value: best_candidate.cloned(),
            confidence: s * 0.6,
            method: best_method,
        },
        _ => FieldConfidence::none(),
    }
}

/// Remove the first occurrence of `matched` from `text` and collapse the
/// resulting whitespace, so a later field-match isn't distracted by an
/// already-claimed substring.
fn remove_matched_text(text: &str, matched: &str) -> String {
    if matched.is_empty() {
        return text.to_string();
    }
    match text.find(matched) {
        Some(start) => {
            let end = start + matched.len();
            let spliced = format!("{}{}", &text[..start], &text[end..]);
            spliced.split_whitespace().collect::<Vec<_>>().join(" ")
        }
        None => text.to_string(),
    }
}

/// Extract all three fields for a normalized description within one
/// catalog year, applying the trimming and hierarchical-gating rules.
pub fn extract_fields(description: &str, index: &CandidateIndex) -> ExtractedFields {
    if index.is_empty() {
        return ExtractedFields {
            marca: FieldConfidence::none(),
            submarca: FieldConfidence::none(),
            tipveh: FieldConfidence::none(),
            descveh: description.to_string(),
        };
    }

    let mut working = description.to_string();

    let marca = extract_field(&working, &index.marca_set);
    if marca.confidence >= TRIM_THRESHOLD {
        if let Some(value) = &marca.value {
            working = remove_matched_text(&working, value);
        }
    }

    let empty_set = HashSet::new();
    let submarca_candidates = if marca.confidence >= 1.0 {
        marca
            .value
            .as_ref()
            .and_then(|m| index.submarca_by_marca.get(m))
            .unwrap_or(&empty_set)
    } else {
        &index.submarca_set
    };
    let submarca_candidates = if submarca_candidates.is_empty() && marca.confidence >= 1.0 {
        &index.submarca_set
    } else {
        submarca_candidates
    };

    let submarca = extract_field(&working, submarca_candidates);
    if submarca.confidence >= TRIM_THRESHOLD {
        if let Some(value) = &submarca.value {
            working = remove_matched_text(&working, value);
        }
    }

    let tipveh = extract_field(&working, &index.tipveh_set);

    ExtractedFields {
        marca,
        submarca,
        tipveh,
        descveh: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn stage_a_prefers_longest_candidate() {
        let candidates = set(&["tracto", "tracto camion"]);
        let result = extract_field("international tracto camion 4x2", &candidates);
        assert_eq!(result.value.as_deref(), Some("tracto camion"));
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.method, ExtractionMethod::Direct);
    }

    #[test]
    fn stage_a_ties_break_lexicographically() {
        // Neither is a substring of the description at equal length, so this
        // exercises ordering rather than matching — sanity check the sort
        // doesn't panic and returns a deterministic non-match.
        let candidates = set(&["zzz", "aaa"]);
        let result = extract_field("no candidate appears here", &candidates);
        assert!(result.value.is_none());
    }

    #[test]
    fn stage_b_high_confidence_band() {
        let candidates = set(&["toyota"]);
        let result = extract_field("toyot", &candidates);
        assert!(result.confidence >= 0.8 && result.confidence <= 0.95);
    }

    #[test]
    fn stage_b_rejects_low_similarity() {
        let candidates = set(&["toyota"]);
        let result = extract_field("completely unrelated text", &candidates);
        assert_eq!(result.confidence, 0.0);
        assert!(result.value.is_none());
    }

    #[test]
    fn empty_candidate_set_yields_none() {
        let result = extract_field("toyota yaris", &HashSet::new());
        assert_eq!(result.method, ExtractionMethod::None);
    }

    #[test]
    fn full_extraction_trims_working_text_between_fields() {
        let mut index = CandidateIndex::default();
        index.marca_set = set(&["international"]);
        index.tipveh_set = set(&["camion"]);
        index.submarca_set = set(&["tracto"]);
        index
            .submarca_by_marca
            .insert("international".to_string(), set(&["tracto"]));

        let fields = extract_fields("international tracto camion 4x2 diesel", &index);
        assert_eq!(fields.marca.value.as_deref(), Some("international"));
        assert_eq!(fields.submarca.value.as_deref(), Some("tracto"));
        assert_eq!(fields.tipveh.value.as_deref(), Some("camion"));
    }

    #[test]
    fn uncertain_marca_does_not_restrict_submarca_candidates() {
        let mut index = CandidateIndex::default();
        index.marca_set = set(&["honda", "toyota"]);
        index.submarca_set = set(&["corolla", "civic"]);
        index
            .submarca_by_marca
            .insert("toyota".to_string(), set(&["corolla"]));
        index
            .submarca_by_marca
            .insert("honda".to_string(), set(&["civic"]));

        // Description only fuzzily resembles "toyota" (confidence < 1.0),
        // yet names the Honda submarca explicitly — it must still be found.
        let fields = extract_fields("toyot civic sedan", &index);
        assert!(fields.marca.confidence < 1.0);
        assert_eq!(fields.submarca.value.as_deref(), Some("civic"));
    }

    #[test]
    fn empty_index_returns_all_none() {
        let fields = extract_fields("toyota yaris", &CandidateIndex::default());
        assert_eq!(fields.marca.method, ExtractionMethod::None);
        assert_eq!(fields.submarca.method, ExtractionMethod::None);
        assert_eq!(fields.tipveh.method, ExtractionMethod::None);
    }
}
