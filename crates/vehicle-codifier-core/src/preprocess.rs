//! Preprocessor (C4).
//!
//! Accepts heterogeneous input — a single record or a `{row_id -> record}`
//! batch, with arbitrary field names — and discovers which field holds the
//! model year and which holds the free-text description by scoring every
//! observed field across all rows. Falls back to an LLM consultation when
//! scoring is inconclusive.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::config::Config;
use crate::error::PipelineError;
use crate::llm::{extract_json_value, LlmProvider, LlmRequest};
use crate::normalize::normalize;

const YEAR_SCORE_THRESHOLD: f32 = 0.3;
const DESCRIPTION_SCORE_THRESHOLD: f32 = 0.2;

const VEHICLE_KEYWORDS: &[&str] = &[
    "toyota", "honda", "nissan", "ford", "chevrolet", "volkswagen", "bmw", "mercedes", "audi",
    "hyundai", "kia", "mazda", "subaru", "renault", "peugeot", "citroen", "international",
    "volvo", "scania", "man", "freightliner", "peterbilt", "sedan", "suv", "hatchback",
    "pickup", "coupe", "convertible", "tracto", "truck", "auto", "car", "vehicle", "carro",
    "automovil", "vehiculo", "motor", "engine", "cilindros", "turbo", "hybrid", "electric",
];

/// A single preprocessed row, ready for C1 normalization and C5 extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedRow {
    pub year: i32,
    pub description: String,
}

/// Output of `Preprocessor::process`: always batch-shaped, keyed by the
/// caller's row id (or `"0"` for a wrapped single record).
pub type PreprocessedBatch = HashMap<String, PreprocessedRow>;

#[derive(Debug, Default, Clone)]
struct FieldPatterns {
    year_field: Option<String>,
    description_field: Option<String>,
    year_candidates: Vec<String>,
    desc_candidates: Vec<String>,
}

struct FieldScores {
    year_score: f32,
    description_score: f32,
}

pub struct Preprocessor<'a> {
    config: &'a Config,
    current_year: i32,
}

impl<'a> Preprocessor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            current_year: current_civil_year(),
        }
    }

    /// Construct with an explicit "current year", bypassing the wall-clock
    /// read. Used by tests and by callers pinning the year range.
    pub fn with_current_year(config: &'a Config, current_year: i32) -> Self {
        Self { config, current_year }
    }

    fn year_range(&self) -> (i32, i32) {
        (
            self.config.extraction.min_vehicle_year,
            self.current_year + self.config.extraction.future_years_ahead,
        )
    }

    /// Process a single record or a `{row_id -> record}` batch. `llm`, if
    /// given, is consulted only when pattern discovery can't confidently
    /// name both fields (spec.md §4.4 step 3); its absence or failure
    /// degrades to an `InvalidInput` error rather than blocking.
    pub async fn process(
        &self,
        input: &Value,
        llm: Option<&dyn LlmProvider>,
    ) -> Result<PreprocessedBatch, PipelineError> {
        let batch = to_batch(input);
        if batch.is_empty() {
            return Ok(HashMap::new());
        }

        let mut patterns = self.discover_field_patterns(&batch);

        if (patterns.year_field.is_none() || patterns.description_field.is_none()) && llm.is_some()
        {
            if let Some((year_suggestion, desc_suggestion)) = self
                .llm_identify_fields(&batch, llm.expect("checked is_some"))
                .await
            {
                if patterns.year_field.is_none() {
                    patterns.year_field = year_suggestion.filter(|f| field_exists(&batch, f));
                }
                if patterns.description_field.is_none() {
                    patterns.description_field = desc_suggestion.filter(|f| field_exists(&batch, f));
                }
            }
        }

        let year_field = patterns.year_field.clone().ok_or_else(|| {
            PipelineError::InvalidInput("unable to identify a year field in the input".to_string())
        })?;
        let description_field = patterns.description_field.clone().ok_or_else(|| {
            PipelineError::InvalidInput(
                "unable to identify a description field in the input".to_string(),
            )
        })?;

        let mut year_candidates = patterns.year_candidates.clone();
        if !year_candidates.contains(&year_field) {
            year_candidates.insert(0, year_field.clone());
        }
        let mut desc_candidates = patterns.desc_candidates.clone();
        if !desc_candidates.contains(&description_field) {
            desc_candidates.insert(0, description_field.clone());
        }

        Ok(self.apply_patterns(&batch, &year_candidates, &desc_candidates))
    }

    fn discover_field_patterns(
        &self,
        batch: &HashMap<String, serde_json::Map<String, Value>>,
    ) -> FieldPatterns {
        let (min_year, max_year) = self.year_range();

        let mut values_by_field: HashMap<String, Vec<Value>> = HashMap::new();
        for row in batch.values() {
            for (field, value) in row {
                values_by_field
                    .entry(field.clone())
                    .or_default()
                    .push(value.clone());
            }
        }

        let mut scores: HashMap<String, FieldScores> = HashMap::new();
        for (field, values) in &values_by_field {
            let year_hits = values
                .iter()
                .filter(|v| extract_year(v, min_year, max_year).is_some())
                .count();
            let year_score = year_hits as f32 / values.len() as f32;

            let desc_scores: Vec<f32> = values
                .iter()
                .map(|v| match v {
                    Value::String(s) if s.trim().chars().count() > 3 => description_score(s),
                    _ => 0.0,
                })
                .collect();
            let description_score = if desc_scores.is_empty() {
                0.0
            } else {
                desc_scores.iter().sum::<f32>() / desc_scores.len() as f32
            };

            scores.insert(field.clone(), FieldScores { year_score, description_score });
        }

        let mut year_candidates: Vec<(String, f32)> = scores
            .iter()
            .filter(|(_, s)| s.year_score > YEAR_SCORE_THRESHOLD)
            .map(|(f, s)| (f.clone(), s.year_score))
            .collect();
        year_candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));

        let mut desc_candidates: Vec<(String, f32)> = scores
            .iter()
            .filter(|(_, s)| s.description_score > DESCRIPTION_SCORE_THRESHOLD)
            .map(|(f, s)| (f.clone(), s.description_score))
            .collect();
        desc_candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));

        FieldPatterns {
            year_field: year_candidates.first().map(|(f, _)| f.clone()),
            description_field: desc_candidates.first().map(|(f, _)| f.clone()),
            year_candidates: year_candidates.into_iter().map(|(f, _)| f).collect(),
            desc_candidates: desc_candidates.into_iter().map(|(f, _)| f).collect(),
        }
    }

    async fn llm_identify_fields(
        &self,
        batch: &HashMap<String, serde_json::Map<String, Value>>,
        llm: &dyn LlmProvider,
    ) -> Option<(Option<String>, Option<String>)> {
        let (min_year, max_year) = self.year_range();

        let sample: Vec<&serde_json::Map<String, Value>> = batch.values().take(3).collect();
        let sample_json = serde_json::to_string_pretty(&sample).ok()?;

        let prompt = format!(
            "Analyze this vehicle data and identify the field names for model year and \
             description.\n\nSample rows:\n{sample_json}\n\nRequirements:\n\
             - Year field: contains years between {min_year} and {max_year}\n\
             - Description field: contains vehicle descriptions (brand, model, type)\n\n\
             Return ONLY JSON in this exact format:\n\
             {{\"year_field\": \"field_name_or_null\", \"description_field\": \"field_name_or_null\"}}"
        );

        let request = LlmRequest::new(prompt, 0.1);
        let response = llm.chat(&request).await.ok()?;
        let value = extract_json_value(&response.text)?;

        let year_field = value.get("year_field").and_then(Value::as_str).map(String::from);
        let description_field = value
            .get("description_field")
            .and_then(Value::as_str)
            .map(String::from);

        Some((year_field, description_field))
    }

    fn apply_patterns(
        &self,
        batch: &HashMap<String, serde_json::Map<String, Value>>,
        year_candidates: &[String],
        desc_candidates: &[String],
    ) -> PreprocessedBatch {
        let (min_year, max_year) = self.year_range();
        let mut result = HashMap::new();

        for (row_id, row) in batch {
            let year = year_candidates
                .iter()
                .filter_map(|field| row.get(field))
                .find_map(|v| extract_year(v, min_year, max_year));

            let description = desc_candidates
                .iter()
                .filter_map(|field| row.get(field))
                .find_map(|v| value_as_text(v))
                .map(|raw| normalize(&raw))
                .filter(|d| d.chars().count() > 2);

            if let (Some(year), Some(description)) = (year, description) {
                result.insert(row_id.clone(), PreprocessedRow { year, description });
            }
        }

        result
    }
}

/// Normalize either input shape into `{row_id -> {field -> value}}`.
/// A batch is recognized when a majority of the top-level values are
/// themselves objects; otherwise the whole map is treated as one row and
/// wrapped under id `"0"` (spec.md §4.4).
fn to_batch(input: &Value) -> HashMap<String, serde_json::Map<String, Value>> {
    let Some(obj) = input.as_object() else {
        return HashMap::new();
    };
    if obj.is_empty() {
        return HashMap::new();
    }

    let sample: Vec<&Value> = obj.values().take(3).collect();
    let object_count = sample.iter().filter(|v| v.is_object()).count();
    let is_batch = object_count * 2 >= sample.len();

    if is_batch {
        obj.iter()
            .filter_map(|(k, v)| v.as_object().map(|row| (k.clone(), row.clone())))
            .collect()
    } else {
        let mut single = HashMap::new();
        single.insert("0".to_string(), obj.clone());
        single
    }
}

fn field_exists(batch: &HashMap<String, serde_json::Map<String, Value>>, field: &str) -> bool {
    batch.values().any(|row| row.contains_key(field))
}

fn extract_year(value: &Value, min_year: i32, max_year: i32) -> Option<i32> {
    match value {
        Value::Number(n) => {
            let y = n.as_i64()? as i32;
            (min_year..=max_year).contains(&y).then_some(y)
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(y) = trimmed.parse::<i32>() {
                return (min_year..=max_year).contains(&y).then_some(y);
            }
            YEAR_IN_TEXT
                .find_iter(trimmed)
                .filter_map(|m| m.as_str().parse::<i32>().ok())
                .find(|y| (min_year..=max_year).contains(y))
        }
        _ => None,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn description_score(text: &str) -> f32 {
    let mut score = 0.0f32;
    let lower = text.to_lowercase();
    let len = text.chars().count();

    if len > 10 {
        score += 0.3;
    }
    if len > 20 {
        score += 0.2;
    }

    let keyword_matches = VEHICLE_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();
    score += keyword_matches as f32 * 0.2;

    let trimmed = text.trim();
    if ID_LIKE.is_match(trimmed) {
        score -= 0.5;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() {
        score -= 0.8;
    }

    score.max(0.0)
}

static YEAR_IN_TEXT: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());
static ID_LIKE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"^[A-Z0-9_-]+$").unwrap());

/// Civil calendar year for the current wall-clock instant, computed without
/// pulling in a date/time crate for one field (Howard Hinnant's
/// days-to-civil-date algorithm, days since the Unix epoch).
fn current_civil_year() -> i32 {
    let days = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_secs() / 86_400) as i64)
        .unwrap_or(0);
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    (if month <= 2 { y + 1 } else { y }) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn wraps_single_record_under_row_zero() {
        let pp = Preprocessor::with_current_year(&config(), 2024);
        let input = json!({"ano": 2022, "desc": "TOYOTA YARIS SEDAN"});
        let out = pp.process(&input, None).await.unwrap();
        assert_eq!(out.len(), 1);
        let row = &out["0"];
        assert_eq!(row.year, 2022);
        assert_eq!(row.description, "toyota yaris sedan");
    }

    #[tokio::test]
    async fn discovers_fields_across_batch_rows() {
        let pp = Preprocessor::with_current_year(&config(), 2024);
        let input = json!({
            "0": {"modelo": 2021, "descripcion": "HONDA CIVIC SEDAN TURBO"},
            "1": {"modelo": 2022, "descripcion": "FORD F150 PICKUP TRUCK"},
            "2": {"modelo": "2020", "descripcion": "NISSAN SENTRA SEDAN"},
        });
        let out = pp.process(&input, None).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out["2"].year, 2020);
        assert!(out["1"].description.contains("pickup"));
    }

    #[tokio::test]
    async fn drops_rows_that_fail_to_parse() {
        let pp = Preprocessor::with_current_year(&config(), 2024);
        let input = json!({
            "0": {"modelo": 2021, "descripcion": "HONDA CIVIC SEDAN"},
            "1": {"modelo": 1800, "descripcion": "TOO OLD TOYOTA"},
        });
        let out = pp.process(&input, None).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("0"));
    }

    #[tokio::test]
    async fn errors_without_llm_when_fields_unidentifiable() {
        let pp = Preprocessor::with_current_year(&config(), 2024);
        let input = json!({"0": {"x": "ABC123", "y": "XYZ999"}});
        let err = pp.process(&input, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn extracts_embedded_year_from_text() {
        assert_eq!(extract_year(&json!("Model year 2019 special"), 1950, 2030), Some(2019));
        assert_eq!(extract_year(&json!("no year here"), 1950, 2030), None);
    }

    #[test]
    fn description_score_penalizes_id_like_values() {
        assert!(description_score("AB12-XYZ") < description_score("TOYOTA YARIS SEDAN 1.5L"));
    }

    #[test]
    fn current_civil_year_is_plausible() {
        let year = current_civil_year();
        assert!(year > 2023 && year < 2100);
    }
}
