use chatprobe_core::config::ValidationConfig;
use chatprobe_core::model::{MetricKey, TestCase, VerdictKind};
use chatprobe_core::validator::Validator;
use chatprobe_metrics::LexicalMetrics;

const EXPECTED: &str = "Paris is the capital of France";

fn capital_case() -> TestCase {
    TestCase::new(1, "What is the capital of France?", EXPECTED).with_expected_data("Paris")
}

#[test]
fn near_identical_answer_passes_every_check() {
    let metrics = LexicalMetrics::new();
    let cfg = ValidationConfig::default();
    let v = Validator::new(&metrics, &cfg)
        .validate(&capital_case(), "Paris is the capital of France.")
        .unwrap();

    assert!(v.passed, "{:?}", v.failure_reasons);
    assert_eq!(v.kind, VerdictKind::Evaluated);
    assert_eq!(v.expected_data_found, Some(true));
    assert!((v.scores.similarity_score - 1.0).abs() < 1e-9);
    assert_eq!(v.scores.keyword_match, 1.0);
    assert!(v.scores.fuzzy_score > 98.0);
    assert!((v.scores.levenshtein_similarity - 30.0 / 31.0).abs() < 1e-9);
    assert!(v.composite_score > 0.99);
}

#[test]
fn non_answer_fails_similarity_and_keywords() {
    let metrics = LexicalMetrics::new();
    let cfg = ValidationConfig::default();
    let v = Validator::new(&metrics, &cfg)
        .validate(&capital_case(), "I don't know.")
        .unwrap();

    assert!(!v.passed);
    assert!(v.failure_reasons.iter().any(|r| r == "similarity_score"));
    assert!(v.failure_reasons.iter().any(|r| r == "keyword_match"));
    assert_eq!(
        v.failure_reasons.last().map(String::as_str),
        Some("expected_data not found")
    );
    assert!(!v.metric_passed(MetricKey::KeywordMatch));
}

#[test]
fn verdict_serialization_is_stable() {
    let metrics = LexicalMetrics::new();
    let cfg = ValidationConfig::default();
    let validator = Validator::new(&metrics, &cfg);
    let a = validator.validate(&capital_case(), "The capital is Paris.").unwrap();
    let b = validator.validate(&capital_case(), "The capital is Paris.").unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}
