//! Score Mixer & Decision (C10).
//!
//! Combines the four per-candidate signals into one `final_score`, picks
//! the best candidate, and classifies it against vehicle-type-dependent
//! thresholds. The review list carries a qualitative label per candidate,
//! bucketed against the same threshold pair used for the decision.

use crate::config::{ReviewConfig, ThresholdPair, ThresholdsConfig, WeightsConfig};
use crate::types::{Candidate, Decision, MatchQuality};

const PASSENGER_KEYWORDS: &[&str] = &["auto", "sedan", "hatchback", "coupe"];
const COMMERCIAL_KEYWORDS: &[&str] = &["camioneta", "pickup", "truck", "tracto", "tracto camion"];
const MOTORCYCLE_KEYWORDS: &[&str] = &["motocicleta", "motorcycle", "moto", "scooter"];

/// Outcome of mixing and deciding: the chosen decision, the suggested
/// catalog row (if any), and the review list to surface to a caller.
pub struct MixResult {
    pub decision: Decision,
    pub suggested_cvegs: Option<String>,
    pub confidence: f32,
    pub review_candidates: Vec<Candidate>,
}

/// Mix the four signals into `final_score`, sort, decide, and build the
/// review list. `candidates` does not need to be pre-sorted.
pub fn mix_and_decide(
    mut candidates: Vec<Candidate>,
    weights: &WeightsConfig,
    thresholds: &ThresholdsConfig,
    review: &ReviewConfig,
) -> MixResult {
    for candidate in candidates.iter_mut() {
        candidate.final_score = weights.filter * candidate.filter_score
            + weights.fuzzy * candidate.fuzzy_score
            + weights.similarity * candidate.similarity_score
            + weights.llm * candidate.llm_score;
    }
    candidates.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());

    let Some(best) = candidates.first() else {
        return MixResult {
            decision: Decision::NoMatch,
            suggested_cvegs: None,
            confidence: 0.0,
            review_candidates: Vec::new(),
        };
    };

    let pair = threshold_pair(&best.tipveh, thresholds);
    let confidence = best.final_score;

    let decision = if confidence >= pair.high {
        Decision::AutoAccept
    } else if confidence >= pair.low {
        Decision::NeedsReview
    } else {
        Decision::NoMatch
    };

    let suggested_cvegs = match decision {
        Decision::NoMatch => None,
        _ => Some(best.cvegs.clone()),
    };

    let list_size = match decision {
        Decision::AutoAccept => review.auto_accept_list_size,
        Decision::NeedsReview => review.needs_review_list_size,
        Decision::NoMatch if review.return_candidates_on_no_match => review.no_match_list_size,
        Decision::NoMatch => 0,
    };

    let mut review_candidates: Vec<Candidate> = candidates.into_iter().take(list_size).collect();
    for candidate in review_candidates.iter_mut() {
        candidate.quality = Some(quality_bucket(candidate.final_score, &pair));
    }

    MixResult {
        decision,
        suggested_cvegs,
        confidence,
        review_candidates,
    }
}

/// Bucket a score against `(high, low)`: `High` at/above `high`, `Medium`
/// between `low` and `high`, `Low` in the lower half of the sub-`low`
/// range, `VeryLow` below that.
fn quality_bucket(score: f32, pair: &ThresholdPair) -> MatchQuality {
    if score >= pair.high {
        MatchQuality::High
    } else if score >= pair.low {
        MatchQuality::Medium
    } else if score >= pair.low * 0.5 {
        MatchQuality::Low
    } else {
        MatchQuality::VeryLow
    }
}

fn threshold_pair<'a>(tipveh: &str, thresholds: &'a ThresholdsConfig) -> ThresholdPair {
    if let Some(category) = thresholds.category_overrides.get(tipveh) {
        return pair_for_category(category, thresholds);
    }

    let normalized = tipveh.trim().to_lowercase();
    if PASSENGER_KEYWORDS.contains(&normalized.as_str()) {
        thresholds.passenger
    } else if COMMERCIAL_KEYWORDS.contains(&normalized.as_str()) {
        thresholds.commercial
    } else if MOTORCYCLE_KEYWORDS.contains(&normalized.as_str()) {
        thresholds.motorcycle
    } else {
        thresholds.default
    }
}

fn pair_for_category(category: &str, thresholds: &ThresholdsConfig) -> ThresholdPair {
    match category {
        "passenger" => thresholds.passenger,
        "commercial" => thresholds.commercial,
        "motorcycle" => thresholds.motorcycle,
        _ => thresholds.default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogRecord;

    fn candidate(cvegs: &str, tipveh: &str, final_components: (f32, f32, f32, f32)) -> Candidate {
        let mut c = Candidate::from_record(&CatalogRecord {
            cvegs: cvegs.to_string(),
            marca: "toyota".to_string(),
            submarca: "yaris".to_string(),
            tipveh: tipveh.to_string(),
            modelo: 2022,
            descveh: "toyota yaris".to_string(),
            embedding: None,
            catalog_version: 1,
        });
        c.filter_score = final_components.0;
        c.fuzzy_score = final_components.1;
        c.similarity_score = final_components.2;
        c.llm_score = final_components.3;
        c
    }

    #[test]
    fn weights_combine_into_final_score() {
        let candidates = vec![candidate("a", "auto", (1.0, 1.0, 1.0, 1.0))];
        let result = mix_and_decide(
            candidates,
            &WeightsConfig::default(),
            &ThresholdsConfig::default(),
            &ReviewConfig::default(),
        );
        assert!((result.confidence - 1.0).abs() < 1e-6);
        assert_eq!(result.decision, Decision::AutoAccept);
        assert_eq!(result.suggested_cvegs.as_deref(), Some("a"));
    }

    #[test]
    fn passenger_threshold_requires_higher_score_than_commercial() {
        let weights = WeightsConfig::default();
        let thresholds = ThresholdsConfig::default();
        let review = ReviewConfig::default();

        // 0.80 clears commercial's 0.75 high bar but not passenger's 0.90.
        let passenger = vec![candidate("p", "sedan", (0.8, 0.8, 0.8, 0.8))];
        let commercial = vec![candidate("c", "pickup", (0.8, 0.8, 0.8, 0.8))];

        let passenger_result = mix_and_decide(passenger, &weights, &thresholds, &review);
        let commercial_result = mix_and_decide(commercial, &weights, &thresholds, &review);

        assert_eq!(passenger_result.decision, Decision::NeedsReview);
        assert_eq!(commercial_result.decision, Decision::AutoAccept);
    }

    #[test]
    fn unknown_tipveh_uses_default_thresholds() {
        let candidates = vec![candidate("x", "unknown-type", (0.85, 0.85, 0.85, 0.85))];
        let result = mix_and_decide(
            candidates,
            &WeightsConfig::default(),
            &ThresholdsConfig::default(),
            &ReviewConfig::default(),
        );
        assert_eq!(result.decision, Decision::AutoAccept);
    }

    #[test]
    fn empty_candidates_yield_no_match() {
        let result = mix_and_decide(
            vec![],
            &WeightsConfig::default(),
            &ThresholdsConfig::default(),
            &ReviewConfig::default(),
        );
        assert_eq!(result.decision, Decision::NoMatch);
        assert!(result.suggested_cvegs.is_none());
    }

    #[test]
    fn review_list_size_depends_on_decision() {
        let many: Vec<Candidate> = (0..10)
            .map(|i| candidate(&format!("c{i}"), "sedan", (0.0, 0.0, 0.0, 0.0)))
            .collect();
        let result = mix_and_decide(
            many,
            &WeightsConfig::default(),
            &ThresholdsConfig::default(),
            &ReviewConfig::default(),
        );
        assert_eq!(result.decision, Decision::NoMatch);
        assert_eq!(result.review_candidates.len(), ReviewConfig::default().no_match_list_size);
    }

    #[test]
    fn review_candidates_are_labeled_by_their_own_score() {
        let candidates = vec![
            candidate("high", "sedan", (1.0, 1.0, 1.0, 1.0)),
            candidate("low", "sedan", (0.1, 0.1, 0.1, 0.1)),
        ];
        let mut review = ReviewConfig::default();
        review.no_match_list_size = 2;
        let result = mix_and_decide(candidates, &WeightsConfig::default(), &ThresholdsConfig::default(), &review);
        assert_eq!(result.review_candidates[0].quality, Some(MatchQuality::High));
        assert_eq!(result.review_candidates[1].quality, Some(MatchQuality::VeryLow));
    }

    #[test]
    fn category_override_takes_precedence_over_keyword_table() {
        let mut thresholds = ThresholdsConfig::default();
        thresholds.category_overrides.insert("furgon".to_string(), "commercial".to_string());
        let candidates = vec![candidate("f", "furgon", (0.76, 0.76, 0.76, 0.76))];
        let result = mix_and_decide(candidates, &WeightsConfig::default(), &thresholds, &ReviewConfig::default());
        assert_eq!(result.decision, Decision::AutoAccept);
    }
}
