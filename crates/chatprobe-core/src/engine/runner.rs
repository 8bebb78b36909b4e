use crate::config::ValidationConfig;
use crate::errors::{AskError, RunAbort};
use crate::metrics_api::SimilarityMetrics;
use crate::model::{TestCase, Verdict};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::session::{ChatDriver, ChatSession, Credentials};
use crate::validator::Validator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything a run produced. `verdicts` is in dataset order.
#[derive(Debug)]
pub struct RunOutcome {
    pub verdicts: Vec<Verdict>,
    /// Set when authentication or the session failed; the verdicts gathered
    /// up to that point are still returned.
    pub abort: Option<RunAbort>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    pub fn passed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.verdicts.len() - self.passed()
    }
}

pub struct TestRunner {
    pub metrics: Arc<dyn SimilarityMetrics>,
    pub config: ValidationConfig,
}

impl TestRunner {
    pub fn new(metrics: Arc<dyn SimilarityMetrics>, config: ValidationConfig) -> Self {
        Self { metrics, config }
    }

    /// Score one answer without a browser. Metric failures become a failed verdict.
    pub fn evaluate(&self, test_case: &TestCase, actual_answer: &str) -> Verdict {
        let validator = Validator::new(self.metrics.as_ref(), &self.config);
        match validator.validate(test_case, actual_answer) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(row = test_case.row, error = %e, "metric computation failed");
                Verdict::metric_error(test_case.clone(), actual_answer.to_string(), &e.to_string())
            }
        }
    }

    /// Authenticate once, then ask every question in order.
    ///
    /// The session is closed before returning, whatever happened.
    pub async fn run<D: ChatDriver>(
        &self,
        cases: &[TestCase],
        session: &mut ChatSession<D>,
        credentials: &Credentials,
        progress: Option<ProgressSink>,
    ) -> RunOutcome {
        let started_at = Utc::now();
        let total = cases.len();
        let mut verdicts = Vec::with_capacity(total);
        let mut abort = None;

        info!(questions = total, "starting run");

        if let Err(e) = session.authenticate(credentials).await {
            error!(error = %e, "run aborted before the first question");
            abort = Some(RunAbort::Auth(e));
        } else {
            for (idx, tc) in cases.iter().enumerate() {
                match session.ask(&tc.question).await {
                    Ok(answer) => verdicts.push(self.evaluate(tc, &answer)),
                    Err(AskError::Timeout(e)) => {
                        warn!(row = tc.row, error = %e, "question got no response");
                        verdicts.push(Verdict::no_response(tc.clone()));
                    }
                    Err(AskError::Fatal(e)) => {
                        error!(
                            row = tc.row,
                            remaining = total - idx,
                            error = %e,
                            "session lost, marking remaining questions"
                        );
                        verdicts.extend(cases[idx..].iter().cloned().map(Verdict::session_terminated));
                        abort = Some(RunAbort::SessionFatal(e));
                        emit(&progress, total, total);
                        break;
                    }
                }
                emit(&progress, verdicts.len(), total);
            }
        }

        session.close().await;

        let outcome = RunOutcome {
            verdicts,
            abort,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            passed = outcome.passed(),
            failed = outcome.failed(),
            aborted = outcome.abort.is_some(),
            "run finished"
        );
        outcome
    }
}

fn emit(progress: &Option<ProgressSink>, done: usize, total: usize) {
    if total > 0 {
        if let Some(sink) = progress {
            sink(ProgressEvent { done, total });
        }
    }
}
