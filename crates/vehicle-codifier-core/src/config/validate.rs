//! Configuration validation: weight sum, threshold ordering, and range checks.
//!
//! Validation runs once at startup (`Config::load`/`load_from`); the core
//! never re-validates per request. A configuration that fails here never
//! processes a match (spec.md §7, `InternalInvariant`).

use crate::error::ConfigError;

use super::Config;

const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

impl Config {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let weight_sum = self.weights.sum();
        if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::ValidationError(format!(
                "weights must sum to 1.0 (+/- {WEIGHT_SUM_TOLERANCE}), got {weight_sum}"
            )));
        }

        for (name, pair) in [
            ("passenger", &self.thresholds.passenger),
            ("commercial", &self.thresholds.commercial),
            ("motorcycle", &self.thresholds.motorcycle),
            ("default", &self.thresholds.default),
        ] {
            if !(0.0..=1.0).contains(&pair.high) || !(0.0..=1.0).contains(&pair.low) {
                return Err(ConfigError::ValidationError(format!(
                    "thresholds.{name} must fall within [0,1]"
                )));
            }
            if pair.low > pair.high {
                return Err(ConfigError::ValidationError(format!(
                    "thresholds.{name}.low must not exceed thresholds.{name}.high"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.extraction.high_confidence_threshold) {
            return Err(ConfigError::ValidationError(
                "extraction.high_confidence_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extraction.fuzzy_accept_threshold) {
            return Err(ConfigError::ValidationError(
                "extraction.fuzzy_accept_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.extraction.future_years_ahead < 0 {
            return Err(ConfigError::ValidationError(
                "extraction.future_years_ahead must be >= 0".into(),
            ));
        }

        if self.rerank.top_n_rerank == 0 {
            return Err(ConfigError::ValidationError(
                "rerank.top_n_rerank must be > 0".into(),
            ));
        }
        if self.review.auto_accept_list_size == 0
            || self.review.needs_review_list_size == 0
            || self.review.no_match_list_size == 0
        {
            return Err(ConfigError::ValidationError(
                "review list sizes must all be > 0".into(),
            ));
        }

        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.embed_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.embed_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.match_deadline_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.match_deadline_ms must be > 0".into(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be > 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_weight_sum() {
        let mut config = Config::default();
        config.weights.filter = 0.5;
        config.weights.fuzzy = 0.3;
        config.weights.similarity = 0.3;
        config.weights.llm = 0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("weights"));
    }

    #[test]
    fn test_validate_accepts_weight_sum_within_tolerance() {
        let mut config = Config::default();
        config.weights.filter = 0.251;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_threshold_pair() {
        let mut config = Config::default();
        config.thresholds.passenger.low = 0.95;
        config.thresholds.passenger.high = 0.90;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("passenger"));
    }

    #[test]
    fn test_validate_rejects_zero_deadline() {
        let mut config = Config::default();
        config.limits.match_deadline_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("match_deadline_ms"));
    }

    #[test]
    fn test_validate_rejects_zero_rerank_top_n() {
        let mut config = Config::default();
        config.rerank.top_n_rerank = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("top_n_rerank"));
    }
}
