//! Reranker Pass A — fuzzy rescoring (C8A).
//!
//! Scores every filtered candidate against the query description using the
//! same Levenshtein-based ratio as the field matcher, independent of which
//! fields were extracted.

use crate::extraction::fuzzy::ratio;
use crate::types::Candidate;

/// Assign `fuzzy_score` to every candidate in place.
pub fn score(description: &str, candidates: &mut [Candidate]) {
    for candidate in candidates.iter_mut() {
        candidate.fuzzy_score = ratio(description, &candidate.descveh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogRecord;

    fn candidate(descveh: &str) -> Candidate {
        Candidate::from_record(&CatalogRecord {
            cvegs: "X".to_string(),
            marca: "toyota".to_string(),
            submarca: "yaris".to_string(),
            tipveh: "auto".to_string(),
            modelo: 2022,
            descveh: descveh.to_string(),
            embedding: None,
            catalog_version: 1,
        })
    }

    #[test]
    fn scores_exact_match_as_one() {
        let mut candidates = vec![candidate("toyota yaris")];
        score("toyota yaris", &mut candidates);
        assert_eq!(candidates[0].fuzzy_score, 1.0);
    }

    #[test]
    fn scores_divergent_text_low() {
        let mut candidates = vec![candidate("ford explorer")];
        score("toyota yaris", &mut candidates);
        assert!(candidates[0].fuzzy_score < 0.5);
    }

    #[test]
    fn handles_empty_candidate_list() {
        let mut candidates: Vec<Candidate> = vec![];
        score("toyota yaris", &mut candidates);
        assert!(candidates.is_empty());
    }
}
