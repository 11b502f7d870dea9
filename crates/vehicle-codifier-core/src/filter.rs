//! Filter Engine (C7).
//!
//! Builds a year-scoped candidate list from the active snapshot, narrowed by
//! whichever extracted fields are trustworthy enough to use as equality
//! clauses. Falls back progressively if the narrowed query comes back empty.

use crate::catalog::CatalogSnapshot;
use crate::types::{Candidate, ExtractedFields};

const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.9;

/// Which field clauses were applied, used to pick the base filter score and
/// to retry a looser predicate if the first pass is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Predicate {
    marca: bool,
    submarca: bool,
    tipveh: bool,
}

impl Predicate {
    fn clause_count(&self) -> usize {
        [self.marca, self.submarca, self.tipveh].iter().filter(|b| **b).count()
    }

    fn base_score(&self) -> f32 {
        match self.clause_count() {
            n if n >= 2 => 1.0,
            1 => 0.95,
            _ => 0.8,
        }
    }

    fn matches(&self, candidate: &crate::types::CatalogRecord, fields: &ExtractedFields) -> bool {
        if self.marca && Some(candidate.marca.as_str()) != fields.marca.value.as_deref() {
            return false;
        }
        if self.submarca && Some(candidate.submarca.as_str()) != fields.submarca.value.as_deref() {
            return false;
        }
        if self.tipveh && Some(candidate.tipveh.as_str()) != fields.tipveh.value.as_deref() {
            return false;
        }
        true
    }
}

/// Run C7 against the active snapshot for year `y`, returning an ordered
/// list of scored (but not yet fuzzy/embedding/LLM-rescored) candidates.
pub fn filter_candidates(
    snapshot: &CatalogSnapshot,
    year: i32,
    fields: &ExtractedFields,
) -> Vec<Candidate> {
    let high_confidence = |c: f32| c >= HIGH_CONFIDENCE_THRESHOLD;

    let full = Predicate {
        marca: high_confidence(fields.marca.confidence) && fields.marca.value.is_some(),
        submarca: high_confidence(fields.submarca.confidence) && fields.submarca.value.is_some(),
        tipveh: high_confidence(fields.tipveh.confidence) && fields.tipveh.value.is_some(),
    };

    // Progressive fallback sequence per spec.md §4.7: the first predicate
    // (narrowest) is tried first; each subsequent one relaxes a clause.
    let sequence = [
        full,
        Predicate { submarca: false, ..full },
        Predicate { submarca: false, tipveh: false, ..full },
        Predicate { marca: false, submarca: false, tipveh: full.tipveh },
        Predicate { marca: false, submarca: false, tipveh: false },
    ];

    let mut seen = std::collections::HashSet::new();
    for predicate in sequence {
        if !seen.insert(predicate) {
            continue;
        }
        let matches: Vec<Candidate> = snapshot
            .records_for_year(year)
            .filter(|record| predicate.matches(record, fields))
            .map(|record| {
                let mut candidate = Candidate::from_record(record);
                candidate.filter_score = predicate.base_score();
                candidate
            })
            .collect();
        if !matches.is_empty() {
            return matches;
        }
    }

    Vec::new()
}

impl std::hash::Hash for Predicate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.marca.hash(state);
        self.submarca.hash(state);
        self.tipveh.hash(state);
    }
}
