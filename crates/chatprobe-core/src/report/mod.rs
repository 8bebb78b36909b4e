pub mod console;
pub mod json;
pub mod progress;
pub mod summary;

use crate::engine::RunOutcome;
use crate::errors::RunAbortKind;
use crate::fingerprint::Fingerprint;
use crate::model::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Explicit record of why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortNotice {
    pub kind: RunAbortKind,
    pub message: String,
}

/// Everything written to `results.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_fingerprint: String,
    pub verdicts: Vec<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortNotice>,
}

impl RunReport {
    pub fn from_outcome(outcome: RunOutcome, fingerprint: &Fingerprint) -> Self {
        let abort = outcome.abort.as_ref().map(|a| AbortNotice {
            kind: a.kind(),
            message: a.to_string(),
        });
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            config_fingerprint: fingerprint.hex.clone(),
            verdicts: outcome.verdicts,
            abort,
        }
    }

    pub fn passed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.verdicts.len() - self.passed()
    }
}
