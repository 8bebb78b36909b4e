//! Turns an (actual, expected) answer pair into a [`Verdict`].
//!
//! Thresholds gate the verdict; weights only shape the composite score,
//! which is reported for ranking and never flips pass/fail on its own.

use crate::config::{ValidationConfig, WeightConfig};
use crate::errors::MetricComputationError;
use crate::metrics_api::SimilarityMetrics;
use crate::model::{MetricKey, MetricScores, TestCase, Verdict, VerdictKind, REASON_EXPECTED_DATA};

pub struct Validator<'a> {
    metrics: &'a dyn SimilarityMetrics,
    config: &'a ValidationConfig,
}

impl<'a> Validator<'a> {
    pub fn new(metrics: &'a dyn SimilarityMetrics, config: &'a ValidationConfig) -> Self {
        Self { metrics, config }
    }

    pub fn validate(
        &self,
        test_case: &TestCase,
        actual_answer: &str,
    ) -> Result<Verdict, MetricComputationError> {
        check_length("actual_answer", actual_answer, self.config.max_input_chars)?;
        check_length(
            "expected_answer",
            &test_case.expected_answer,
            self.config.max_input_chars,
        )?;

        let scores = self.metrics.score(actual_answer, &test_case.expected_answer);
        for key in MetricKey::ALL {
            check_range(key, scores.get(key))?;
        }

        let expected_data_found = test_case
            .expected_data
            .as_deref()
            .map(|data| expected_data_found(data, actual_answer));

        let mut failure_reasons: Vec<String> = MetricKey::ALL
            .iter()
            .filter(|key| scores.get(**key) < self.config.thresholds.get(**key))
            .map(|key| key.as_str().to_string())
            .collect();
        if expected_data_found == Some(false) {
            failure_reasons.push(REASON_EXPECTED_DATA.to_string());
        }

        Ok(Verdict {
            test_case: test_case.clone(),
            actual_answer: actual_answer.to_string(),
            composite_score: composite_score(&scores, &self.config.weights),
            passed: failure_reasons.is_empty(),
            failure_reasons,
            scores,
            kind: VerdictKind::Evaluated,
            expected_data_found,
        })
    }
}

/// Weighted mean of the normalized scores, clamped to [0, 1].
pub fn composite_score(scores: &MetricScores, weights: &WeightConfig) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = MetricKey::ALL
        .iter()
        .map(|key| weights.get(*key) * scores.normalized(*key))
        .sum();
    (weighted / total).clamp(0.0, 1.0)
}

/// Case-insensitive substring check.
pub fn expected_data_found(expected_data: &str, actual_answer: &str) -> bool {
    let needle = expected_data.trim().to_lowercase();
    needle.is_empty() || actual_answer.to_lowercase().contains(&needle)
}

fn check_length(
    field: &'static str,
    text: &str,
    limit: usize,
) -> Result<(), MetricComputationError> {
    let len = text.chars().count();
    if len > limit {
        return Err(MetricComputationError::InputTooLong { field, len, limit });
    }
    Ok(())
}

fn check_range(metric: MetricKey, value: f64) -> Result<(), MetricComputationError> {
    if !value.is_finite() {
        return Err(MetricComputationError::NonFinite { metric });
    }
    let max = metric.range_max();
    if !(0.0..=max).contains(&value) {
        return Err(MetricComputationError::OutOfRange { metric, value, max });
    }
    Ok(())
}
