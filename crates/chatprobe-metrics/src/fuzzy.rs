//! Indel-based fuzzy ratio on a 0..=100 scale.

use crate::tokenize::words;

/// Length of the longest common subsequence, two-row DP over chars.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (a, b) = if a.len() < b.len() { (b, a) } else { (a, b) };
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// `2 * lcs / (len_a + len_b) * 100`; two empty strings are identical.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn token_sorted(s: &str) -> Option<String> {
    let mut w = words(s);
    if w.is_empty() {
        return None;
    }
    w.sort_unstable();
    Some(w.join(" "))
}

/// Best of a plain ratio and a word-order-insensitive ratio.
///
/// The sorted variant only applies when both sides have words; otherwise
/// two different punctuation-only strings would compare as equal.
pub fn fuzzy_score(actual: &str, expected: &str) -> f64 {
    let plain = indel_ratio(&collapse(actual), &collapse(expected));
    let sorted = match (token_sorted(actual), token_sorted(expected)) {
        (Some(a), Some(e)) => indel_ratio(&a, &e),
        _ => 0.0,
    };
    plain.max(sorted).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcs_basics() {
        let c = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(lcs_len(&c("abcde"), &c("ace")), 3);
        assert_eq!(lcs_len(&c(""), &c("abc")), 0);
        assert_eq!(lcs_len(&c("kitten"), &c("sitting")), 4);
    }

    #[test]
    fn one_trailing_char_costs_little() {
        let s = fuzzy_score(
            "Paris is the capital of France.",
            "Paris is the capital of France",
        );
        // sorted variant drops punctuation, so the texts become identical
        assert!((s - 100.0).abs() < 1e-9, "{s}");
        let plain = indel_ratio("paris is the capital of france.", "paris is the capital of france");
        assert!((plain - 6000.0 / 61.0).abs() < 1e-9);
    }

    #[test]
    fn word_order_is_tolerated() {
        let s = fuzzy_score("France capital Paris", "Paris capital France");
        assert_eq!(s, 100.0);
    }

    #[test]
    fn case_and_spacing_are_ignored() {
        assert_eq!(fuzzy_score("HELLO   world", "hello world"), 100.0);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(fuzzy_score("", ""), 100.0);
        assert_eq!(fuzzy_score("", "something"), 0.0);
        assert_eq!(fuzzy_score("...", "!!!"), 0.0);
    }
}
