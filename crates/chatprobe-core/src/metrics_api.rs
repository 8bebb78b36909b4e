use crate::model::MetricScores;

/// Four independent similarity signals between an actual and an expected answer.
///
/// Implementations must be pure: identical inputs always produce identical
/// scores. Ranges: `fuzzy_score` in [0, 100], everything else in [0, 1].
pub trait SimilarityMetrics: Send + Sync {
    fn name(&self) -> &'static str;

    /// Bumped whenever scoring logic changes; part of the run fingerprint.
    fn version(&self) -> &'static str;

    fn similarity_score(&self, actual: &str, expected: &str) -> f64;
    fn keyword_match(&self, actual: &str, expected: &str) -> f64;
    fn fuzzy_score(&self, actual: &str, expected: &str) -> f64;
    fn levenshtein_similarity(&self, actual: &str, expected: &str) -> f64;

    fn score(&self, actual: &str, expected: &str) -> MetricScores {
        MetricScores {
            similarity_score: self.similarity_score(actual, expected),
            keyword_match: self.keyword_match(actual, expected),
            fuzzy_score: self.fuzzy_score(actual, expected),
            levenshtein_similarity: self.levenshtein_similarity(actual, expected),
        }
    }
}
