//! Core data types for the vehicle codification pipeline.
//!
//! These types mirror the data model: catalog rows, the derived candidate
//! index, per-field extraction results, per-candidate scores, and the final
//! match result returned to callers.

use serde::{Deserialize, Serialize};

/// One row of the active catalog snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Stable string key, unique within a snapshot.
    pub cvegs: String,
    /// Normalized lowercase brand. May be empty.
    pub marca: String,
    /// Normalized lowercase sub-brand. May be empty.
    pub submarca: String,
    /// Normalized lowercase vehicle type/use. May be empty.
    pub tipveh: String,
    /// Model year.
    pub modelo: i32,
    /// Normalized free-text description.
    pub descveh: String,
    /// Dense, L2-normalized embedding. Absent is permitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Snapshot identifier this record belongs to.
    pub catalog_version: u64,
}

/// Extraction method that produced a `FieldConfidence` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Direct,
    FuzzyPartial,
    FuzzyToken,
    Llm,
    LlmValidated,
    LlmCorrected,
    None,
}

/// A single extracted field with its confidence and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfidence {
    pub value: Option<String>,
    pub confidence: f32,
    pub method: ExtractionMethod,
}

impl FieldConfidence {
    pub fn none() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            method: ExtractionMethod::None,
        }
    }

    pub fn is_certain(&self) -> bool {
        self.value.is_some() && self.confidence >= 1.0
    }
}

impl Default for FieldConfidence {
    fn default() -> Self {
        Self::none()
    }
}

/// Result of field extraction (C5/C6) for one `(year, description)` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub marca: FieldConfidence,
    pub submarca: FieldConfidence,
    pub tipveh: FieldConfidence,
    pub descveh: String,
}

impl ExtractedFields {
    /// Mean confidence across the three fields, used by the LLM fallback
    /// trigger in C6.
    pub fn mean_confidence(&self) -> f32 {
        (self.marca.confidence + self.submarca.confidence + self.tipveh.confidence) / 3.0
    }

    /// Whether any field reaches the "good" confidence bar on its own.
    pub fn any_field_confident(&self, threshold: f32) -> bool {
        self.marca.confidence >= threshold
            || self.submarca.confidence >= threshold
            || self.tipveh.confidence >= threshold
    }
}

/// A qualitative bucket assigned to a candidate's final score relative to
/// the decision thresholds, surfaced to reviewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    High,
    Medium,
    Low,
    VeryLow,
}

/// A scored catalog row produced during one match, carrying every signal
/// assigned by C7/C8A/C8B/C9 plus the mixer's `final_score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub cvegs: String,
    pub marca: String,
    pub submarca: String,
    pub modelo: i32,
    pub descveh: String,
    pub tipveh: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    pub filter_score: f32,
    pub fuzzy_score: f32,
    pub similarity_score: f32,
    pub llm_score: f32,
    /// Assigned only by the Score Mixer (C10); every other stage leaves
    /// this at 0.0.
    pub final_score: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<MatchQuality>,
}

impl Candidate {
    pub fn from_record(record: &CatalogRecord) -> Self {
        Self {
            cvegs: record.cvegs.clone(),
            marca: record.marca.clone(),
            submarca: record.submarca.clone(),
            modelo: record.modelo,
            descveh: record.descveh.clone(),
            tipveh: record.tipveh.clone(),
            embedding: record.embedding.clone(),
            filter_score: 0.0,
            fuzzy_score: 0.0,
            similarity_score: 0.0,
            llm_score: 0.0,
            final_score: 0.0,
            quality: None,
        }
    }
}

/// The decision produced by the Score Mixer (C10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AutoAccept,
    NeedsReview,
    NoMatch,
}

/// Free-form diagnostics attached to a `MatchResult` when requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub stages_run: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_triggered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    pub notes: Vec<String>,
}

/// The result of a single `match_vehicle` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub decision: Decision,
    pub suggested_cvegs: Option<String>,
    pub confidence: f32,
    pub extracted_fields: ExtractedFields,
    pub top_candidates: Vec<Candidate>,
    pub processing_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CatalogRecord {
        CatalogRecord {
            cvegs: "T1".to_string(),
            marca: "toyota".to_string(),
            submarca: "yaris".to_string(),
            tipveh: "auto".to_string(),
            modelo: 2022,
            descveh: "yaris sol l".to_string(),
            embedding: Some(vec![0.1, 0.2, 0.3]),
            catalog_version: 1,
        }
    }

    #[test]
    fn candidate_from_record_starts_unscored() {
        let candidate = Candidate::from_record(&sample_record());
        assert_eq!(candidate.final_score, 0.0);
        assert_eq!(candidate.filter_score, 0.0);
        assert_eq!(candidate.cvegs, "T1");
    }

    #[test]
    fn field_confidence_is_certain_only_at_one() {
        let certain = FieldConfidence {
            value: Some("toyota".to_string()),
            confidence: 1.0,
            method: ExtractionMethod::Direct,
        };
        assert!(certain.is_certain());

        let plausible = FieldConfidence {
            value: Some("toyota".to_string()),
            confidence: 0.95,
            method: ExtractionMethod::FuzzyPartial,
        };
        assert!(!plausible.is_certain());
    }

    #[test]
    fn extracted_fields_mean_confidence() {
        let fields = ExtractedFields {
            marca: FieldConfidence {
                value: Some("toyota".into()),
                confidence: 0.9,
                method: ExtractionMethod::Direct,
            },
            submarca: FieldConfidence {
                value: Some("yaris".into()),
                confidence: 0.6,
                method: ExtractionMethod::FuzzyPartial,
            },
            tipveh: FieldConfidence::none(),
            descveh: "yaris sol l".to_string(),
        };
        assert!((fields.mean_confidence() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn match_result_serializes_without_diagnostics_by_default() {
        let result = MatchResult {
            decision: Decision::NoMatch,
            suggested_cvegs: None,
            confidence: 0.0,
            extracted_fields: ExtractedFields {
                marca: FieldConfidence::none(),
                submarca: FieldConfidence::none(),
                tipveh: FieldConfidence::none(),
                descveh: String::new(),
            },
            top_candidates: vec![],
            processing_time_ms: 1.0,
            diagnostics: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("diagnostics"));
        assert!(json.contains("\"decision\":\"no_match\""));
    }
}
