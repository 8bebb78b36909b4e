//! Lexical implementations of the four chatprobe similarity metrics.
//!
//! Everything here is deterministic and allocation-bounded by input length;
//! no models, no network.

pub mod cosine;
pub mod fuzzy;
pub mod tokenize;

use chatprobe_core::metrics_api::SimilarityMetrics;

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalMetrics;

impl LexicalMetrics {
    pub fn new() -> Self {
        Self
    }
}

/// Share of the expected answer's keywords present in the actual answer.
pub fn keyword_match(actual: &str, expected: &str) -> f64 {
    let wanted = tokenize::keywords(expected);
    if wanted.is_empty() {
        return 1.0;
    }
    let found = tokenize::keywords(actual);
    let hits = wanted.intersection(&found).count();
    hits as f64 / wanted.len() as f64
}

/// `1 - distance / max_len` over chars, case-sensitive.
pub fn levenshtein_similarity(actual: &str, expected: &str) -> f64 {
    strsim::normalized_levenshtein(actual, expected).clamp(0.0, 1.0)
}

impl SimilarityMetrics for LexicalMetrics {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn version(&self) -> &'static str {
        "1"
    }

    fn similarity_score(&self, actual: &str, expected: &str) -> f64 {
        cosine::cosine_similarity(actual, expected)
    }

    fn keyword_match(&self, actual: &str, expected: &str) -> f64 {
        keyword_match(actual, expected)
    }

    fn fuzzy_score(&self, actual: &str, expected: &str) -> f64 {
        fuzzy::fuzzy_score(actual, expected)
    }

    fn levenshtein_similarity(&self, actual: &str, expected: &str) -> f64 {
        levenshtein_similarity(actual, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_counts_expected_keywords_only() {
        // expected keywords: paris, capital, france
        let s = keyword_match("Paris is lovely", "Paris is the capital of France");
        assert!((s - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn keyword_match_with_no_expected_keywords_is_full() {
        assert_eq!(keyword_match("anything", "it is what it is"), 1.0);
        assert_eq!(keyword_match("", ""), 1.0);
    }

    #[test]
    fn levenshtein_is_case_sensitive() {
        assert_eq!(levenshtein_similarity("", ""), 1.0);
        assert_eq!(levenshtein_similarity("abc", "abc"), 1.0);
        assert!((levenshtein_similarity("Abc", "abc") - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_actual_collapses_scores() {
        let m = LexicalMetrics::new();
        let s = m.score("", "Paris is the capital of France");
        assert_eq!(s.similarity_score, 0.0);
        assert_eq!(s.keyword_match, 0.0);
        assert_eq!(s.fuzzy_score, 0.0);
        assert_eq!(s.levenshtein_similarity, 0.0);
    }
}
