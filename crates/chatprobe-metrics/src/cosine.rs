use crate::tokenize::words;
use std::collections::HashMap;

fn term_counts(tokens: &[String]) -> HashMap<&str, f64> {
    let mut counts = HashMap::new();
    for t in tokens {
        *counts.entry(t.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of term-frequency vectors.
pub fn cosine_similarity(actual: &str, expected: &str) -> f64 {
    if actual == expected {
        return 1.0;
    }
    let a = words(actual);
    let e = words(expected);
    if a.is_empty() && e.is_empty() {
        let norm = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        return if norm(actual) == norm(expected) { 1.0 } else { 0.0 };
    }
    if a.is_empty() || e.is_empty() {
        return 0.0;
    }

    let ca = term_counts(&a);
    let ce = term_counts(&e);
    let dot: f64 = ca
        .iter()
        .filter_map(|(term, n)| ce.get(term).map(|m| n * m))
        .sum();
    let norm_a = ca.values().map(|n| n * n).sum::<f64>().sqrt();
    let norm_e = ce.values().map(|n| n * n).sum::<f64>().sqrt();
    (dot / (norm_a * norm_e)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_punctuation_does_not_matter() {
        let s = cosine_similarity(
            "Paris is the capital of France.",
            "Paris is the capital of France",
        );
        assert!((s - 1.0).abs() < 1e-9, "{s}");
    }

    #[test]
    fn disjoint_vocabulary_scores_zero() {
        assert_eq!(cosine_similarity("I don't know.", "Paris is the capital"), 0.0);
    }

    #[test]
    fn partial_overlap() {
        // a = {paris:1, rocks:1}, e = {paris:1}: 1 / sqrt(2)
        let s = cosine_similarity("Paris rocks", "Paris");
        assert!((s - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn tokenless_texts_compare_normalized() {
        assert_eq!(cosine_similarity("...", " ... "), 1.0);
        assert_eq!(cosine_similarity("...", "!!!"), 0.0);
        assert_eq!(cosine_similarity("", ""), 1.0);
        assert_eq!(cosine_similarity("", "Paris"), 0.0);
    }
}
