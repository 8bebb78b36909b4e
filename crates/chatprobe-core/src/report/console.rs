use crate::model::{Verdict, VerdictKind};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::RunReport;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Running question {}/{}...", done, total)
}

/// Minimum interval between progress updates to avoid log spam.
const PROGRESS_MIN_INTERVAL_MS: u64 = 200;

/// For large datasets, emit at most every this many questions.
pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

/// Throttled sink printing progress lines to stderr. `None` for single-question runs.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    let step = progress_step(total);
    let last_emit: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
    Some(Arc::new(move |ev: ProgressEvent| {
        if ev.total == 0 {
            return;
        }
        let now = Instant::now();
        let should_emit = {
            let mut last = last_emit.lock().unwrap_or_else(|p| p.into_inner());
            let emit_final = ev.done == ev.total;
            let emit_step = ev.done.is_multiple_of(step) || ev.done == 1;
            let interval_ok = last
                .map(|t| {
                    now.saturating_duration_since(t)
                        >= Duration::from_millis(PROGRESS_MIN_INTERVAL_MS)
                })
                .unwrap_or(true);
            let ok = emit_final || (emit_step && interval_ok);
            if ok {
                *last = Some(now);
            }
            ok
        };
        if should_emit {
            eprintln!("{}", format_progress_line(ev.done, ev.total));
        }
    }))
}

/// One console line for a verdict.
#[must_use]
pub fn format_verdict_line(v: &Verdict) -> String {
    let row = format!("row {}", v.test_case.row);
    match v.kind {
        VerdictKind::Evaluated if v.passed => {
            format!("✅ {:<8} {:.2}", row, v.composite_score)
        }
        VerdictKind::Evaluated => format!(
            "❌ {:<8} {:.2}  {}",
            row,
            v.composite_score,
            v.failure_reasons.join(", ")
        ),
        VerdictKind::NoResponse | VerdictKind::SessionTerminated => {
            format!("⏭️  {:<8} {}", row, v.failure_reasons.join(", "))
        }
        VerdictKind::MetricError => {
            format!("💥 {:<8} {}", row, v.failure_reasons.join(", "))
        }
    }
}

pub fn print_summary(report: &RunReport) {
    eprintln!();
    for v in &report.verdicts {
        eprintln!("{}", format_verdict_line(v));
        if !v.passed && v.kind == VerdictKind::Evaluated {
            eprintln!("      Question: \"{}\"", truncate(&v.test_case.question, 100));
        }
    }

    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!(
        "Summary: {} passed, {} failed, {} total",
        report.passed(),
        report.failed(),
        report.verdicts.len()
    );
    if let Some(abort) = &report.abort {
        eprintln!("Run aborted: {}", abort.message);
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestCase;

    #[test]
    fn format_progress_line_contains_done_and_total() {
        let s = format_progress_line(3, 10);
        assert_eq!(s, "Running question 3/10...");
    }

    #[test]
    fn default_progress_sink_none_for_total_0_or_1() {
        assert!(default_progress_sink(0).is_none());
        assert!(default_progress_sink(1).is_none());
        assert!(default_progress_sink(2).is_some());
    }

    #[test]
    fn progress_step_logic() {
        assert_eq!(progress_step(5), 1);
        assert_eq!(progress_step(10), 1);
        assert_eq!(progress_step(25), 2);
        assert_eq!(progress_step(100), 10);
    }

    #[test]
    fn verdict_line_shows_reasons_for_failures() {
        let line = format_verdict_line(&Verdict::no_response(TestCase::new(7, "q", "a")));
        assert!(line.contains("row 7"));
        assert!(line.contains("no response received"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("hi", 5), "hi");
    }
}
