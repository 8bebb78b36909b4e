use serde::{Deserialize, Serialize};
use std::fmt;

pub const REASON_EXPECTED_DATA: &str = "expected_data not found";
pub const REASON_NO_RESPONSE: &str = "no response received";
pub const REASON_SESSION_TERMINATED: &str = "session terminated";

/// The fixed set of similarity signals a verdict is gated on.
///
/// Declaration order is the order used for failure reasons and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    SimilarityScore,
    KeywordMatch,
    FuzzyScore,
    LevenshteinSimilarity,
}

impl MetricKey {
    pub const ALL: [MetricKey; 4] = [
        MetricKey::SimilarityScore,
        MetricKey::KeywordMatch,
        MetricKey::FuzzyScore,
        MetricKey::LevenshteinSimilarity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::SimilarityScore => "similarity_score",
            MetricKey::KeywordMatch => "keyword_match",
            MetricKey::FuzzyScore => "fuzzy_score",
            MetricKey::LevenshteinSimilarity => "levenshtein_similarity",
        }
    }

    /// Upper bound of the metric's natural range (lower bound is always 0).
    pub fn range_max(self) -> f64 {
        match self {
            MetricKey::FuzzyScore => 100.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dataset row. `row` is the 1-based position in the source dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub row: usize,
    pub question: String,
    pub expected_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_data: Option<String>,
}

impl TestCase {
    pub fn new(row: usize, question: impl Into<String>, expected_answer: impl Into<String>) -> Self {
        Self {
            row,
            question: question.into(),
            expected_answer: expected_answer.into(),
            expected_data: None,
        }
    }

    pub fn with_expected_data(mut self, data: impl Into<String>) -> Self {
        let data = data.into();
        self.expected_data = if data.trim().is_empty() {
            None
        } else {
            Some(data)
        };
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricScores {
    pub similarity_score: f64,
    pub keyword_match: f64,
    pub fuzzy_score: f64,
    pub levenshtein_similarity: f64,
}

impl MetricScores {
    pub fn get(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::SimilarityScore => self.similarity_score,
            MetricKey::KeywordMatch => self.keyword_match,
            MetricKey::FuzzyScore => self.fuzzy_score,
            MetricKey::LevenshteinSimilarity => self.levenshtein_similarity,
        }
    }

    /// Value scaled into [0, 1].
    pub fn normalized(&self, key: MetricKey) -> f64 {
        self.get(key) / key.range_max()
    }
}

/// How a verdict came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    /// The bot answered and the validator scored the answer.
    Evaluated,
    /// Every attempt timed out.
    NoResponse,
    /// The answer could not be scored.
    MetricError,
    /// The session died before this question could be asked.
    SessionTerminated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub test_case: TestCase,
    pub actual_answer: String,
    pub scores: MetricScores,
    pub composite_score: f64,
    pub passed: bool,
    pub failure_reasons: Vec<String>,
    pub kind: VerdictKind,
    /// `None` when the test case carries no expected data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_data_found: Option<bool>,
}

impl Verdict {
    fn unscored(test_case: TestCase, actual_answer: String, kind: VerdictKind, reason: String) -> Self {
        Self {
            test_case,
            actual_answer,
            scores: MetricScores::default(),
            composite_score: 0.0,
            passed: false,
            failure_reasons: vec![reason],
            kind,
            expected_data_found: None,
        }
    }

    pub fn no_response(test_case: TestCase) -> Self {
        Self::unscored(
            test_case,
            String::new(),
            VerdictKind::NoResponse,
            REASON_NO_RESPONSE.to_string(),
        )
    }

    pub fn session_terminated(test_case: TestCase) -> Self {
        Self::unscored(
            test_case,
            String::new(),
            VerdictKind::SessionTerminated,
            REASON_SESSION_TERMINATED.to_string(),
        )
    }

    pub fn metric_error(test_case: TestCase, actual_answer: String, detail: &str) -> Self {
        Self::unscored(
            test_case,
            actual_answer,
            VerdictKind::MetricError,
            format!("metric computation failed: {detail}"),
        )
    }

    /// Whether `key` met its threshold. Only scored verdicts can pass a metric.
    pub fn metric_passed(&self, key: MetricKey) -> bool {
        self.kind == VerdictKind::Evaluated
            && !self.failure_reasons.iter().any(|r| r == key.as_str())
    }
}
