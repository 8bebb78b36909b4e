//! Machine-readable `summary.json`.
//!
//! Downstream tooling should branch on `reason_code`, not on the exit code.

use crate::model::{MetricKey, MetricScores, Verdict, VerdictKind};
use crate::report::{AbortNotice, RunReport};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub schema_version: u32,

    /// 0 all passed, 1 test failures, 2 input error, 3 run aborted
    pub exit_code: i32,

    /// Stable machine-readable reason, empty on success
    pub reason_code: String,

    pub message: String,

    pub run_id: String,

    pub config_fingerprint: String,

    pub results: ResultsSummary,

    /// Means over evaluated verdicts; absent when nothing was evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreSummary>,

    pub label_agreement: LabelAgreement,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortNotice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub passed: usize,
    pub failed: usize,
    pub no_response: usize,
    pub metric_error: usize,
    pub session_terminated: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub evaluated: usize,
    pub mean_composite: f64,
    pub mean_scores: MetricScores,
}

/// Agreement between a lenient and a strict pass label per verdict.
///
/// Strict: keyword, fuzzy and expected-data checks all pass.
/// Lenient: at least one of them passes. Strict is the reference label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelAgreement {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ResultsSummary {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let mut out = ResultsSummary {
            total: verdicts.len(),
            ..Default::default()
        };
        for v in verdicts {
            if v.passed {
                out.passed += 1;
            } else {
                out.failed += 1;
            }
            match v.kind {
                VerdictKind::Evaluated => {}
                VerdictKind::NoResponse => out.no_response += 1,
                VerdictKind::MetricError => out.metric_error += 1,
                VerdictKind::SessionTerminated => out.session_terminated += 1,
            }
        }
        out
    }
}

impl ScoreSummary {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Option<Self> {
        let evaluated: Vec<&Verdict> = verdicts
            .iter()
            .filter(|v| v.kind == VerdictKind::Evaluated)
            .collect();
        if evaluated.is_empty() {
            return None;
        }
        let n = evaluated.len() as f64;
        let mean = |key: MetricKey| evaluated.iter().map(|v| v.scores.get(key)).sum::<f64>() / n;
        Some(ScoreSummary {
            evaluated: evaluated.len(),
            mean_composite: evaluated.iter().map(|v| v.composite_score).sum::<f64>() / n,
            mean_scores: MetricScores {
                similarity_score: mean(MetricKey::SimilarityScore),
                keyword_match: mean(MetricKey::KeywordMatch),
                fuzzy_score: mean(MetricKey::FuzzyScore),
                levenshtein_similarity: mean(MetricKey::LevenshteinSimilarity),
            },
        })
    }
}

fn checks(v: &Verdict) -> [bool; 3] {
    let data_ok = v.kind == VerdictKind::Evaluated && v.expected_data_found != Some(false);
    [
        v.metric_passed(MetricKey::KeywordMatch),
        v.metric_passed(MetricKey::FuzzyScore),
        data_ok,
    ]
}

pub fn strict_label(v: &Verdict) -> bool {
    checks(v).iter().all(|c| *c)
}

pub fn lenient_label(v: &Verdict) -> bool {
    checks(v).iter().any(|c| *c)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl LabelAgreement {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        let (mut tp, mut fp, mut fn_, mut tn) = (0usize, 0usize, 0usize, 0usize);
        for v in verdicts {
            match (strict_label(v), lenient_label(v)) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => tn += 1,
            }
        }
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        LabelAgreement {
            accuracy: ratio(tp + tn, verdicts.len()),
            precision,
            recall,
            f1,
        }
    }
}

impl Summary {
    pub fn from_report(report: &RunReport, exit_code: i32, reason_code: impl Into<String>) -> Self {
        let results = ResultsSummary::from_verdicts(&report.verdicts);
        let message = match &report.abort {
            Some(notice) => format!("Run aborted: {}", notice.message),
            None if results.failed == 0 => "All questions passed".to_string(),
            None => format!("{} of {} questions failed", results.failed, results.total),
        };
        Self {
            schema_version: SCHEMA_VERSION,
            exit_code,
            reason_code: reason_code.into(),
            message,
            run_id: report.run_id.clone(),
            config_fingerprint: report.config_fingerprint.clone(),
            scores: ScoreSummary::from_verdicts(&report.verdicts),
            label_agreement: LabelAgreement::from_verdicts(&report.verdicts),
            results,
            abort: report.abort.clone(),
        }
    }
}

pub fn write_summary(summary: &Summary, out: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(out, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestCase;
    use chrono::Utc;

    fn evaluated(reasons: &[&str], data_found: Option<bool>) -> Verdict {
        Verdict {
            test_case: TestCase::new(1, "q", "a"),
            actual_answer: "a".into(),
            scores: MetricScores {
                similarity_score: 0.5,
                keyword_match: 0.5,
                fuzzy_score: 50.0,
                levenshtein_similarity: 0.5,
            },
            composite_score: 0.5,
            passed: reasons.is_empty(),
            failure_reasons: reasons.iter().map(|r| r.to_string()).collect(),
            kind: VerdictKind::Evaluated,
            expected_data_found: data_found,
        }
    }

    fn report(verdicts: Vec<Verdict>) -> RunReport {
        RunReport {
            run_id: "r".into(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            config_fingerprint: "f".into(),
            verdicts,
            abort: None,
        }
    }

    #[test]
    fn strict_requires_every_check_lenient_any() {
        let all = evaluated(&[], Some(true));
        assert!(strict_label(&all) && lenient_label(&all));

        let fuzzy_only = evaluated(&["keyword_match", "expected_data not found"], Some(false));
        assert!(!strict_label(&fuzzy_only));
        assert!(lenient_label(&fuzzy_only));

        let none = evaluated(&["keyword_match", "fuzzy_score", "expected_data not found"], Some(false));
        assert!(!strict_label(&none) && !lenient_label(&none));

        let unscored = Verdict::no_response(TestCase::new(2, "q", "a"));
        assert!(!strict_label(&unscored) && !lenient_label(&unscored));
    }

    #[test]
    fn label_agreement_matches_hand_computed_values() {
        // tp=1, fp=2, fn=0, tn=1
        let verdicts = vec![
            evaluated(&[], None),
            evaluated(&["keyword_match"], None),
            evaluated(&["fuzzy_score"], None),
            Verdict::session_terminated(TestCase::new(4, "q", "a")),
        ];
        let la = LabelAgreement::from_verdicts(&verdicts);
        assert!((la.accuracy - 0.5).abs() < 1e-12);
        assert!((la.precision - 1.0 / 3.0).abs() < 1e-12);
        assert!((la.recall - 1.0).abs() < 1e-12);
        assert!((la.f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_run_yields_zeroes_not_nan() {
        let la = LabelAgreement::from_verdicts(&[]);
        assert_eq!(la, LabelAgreement::default());
        assert!(ScoreSummary::from_verdicts(&[]).is_none());
    }

    #[test]
    fn means_ignore_unscored_verdicts() {
        let verdicts = vec![
            evaluated(&[], None),
            Verdict::no_response(TestCase::new(2, "q", "a")),
        ];
        let scores = ScoreSummary::from_verdicts(&verdicts).unwrap();
        assert_eq!(scores.evaluated, 1);
        assert!((scores.mean_composite - 0.5).abs() < 1e-12);
        assert!((scores.mean_scores.fuzzy_score - 50.0).abs() < 1e-12);

        let results = ResultsSummary::from_verdicts(&verdicts);
        assert_eq!((results.passed, results.failed, results.no_response), (1, 1, 1));
    }

    #[test]
    fn summary_message_reflects_outcome() {
        let s = Summary::from_report(&report(vec![evaluated(&[], None)]), 0, "");
        assert_eq!(s.message, "All questions passed");

        let s = Summary::from_report(&report(vec![evaluated(&["fuzzy_score"], None)]), 1, "E_TEST_FAILED");
        assert_eq!(s.message, "1 of 1 questions failed");
        assert_eq!(s.reason_code, "E_TEST_FAILED");
    }

    #[test]
    fn write_summary_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let s = Summary::from_report(&report(vec![]), 0, "");
        write_summary(&s, &path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["schema_version"], 1);
        assert!(v.get("scores").is_none());
    }
}
