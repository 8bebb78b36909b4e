use crate::model::MetricKey;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Login did not succeed. Fatal to the run: no question can be asked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication failed: {reason}")]
pub struct AuthError {
    pub reason: String,
}

impl AuthError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// No reply arrived for a question after every allowed attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no response within {timeout_ms}ms after {attempts} attempt(s)")]
pub struct ResponseTimeoutError {
    pub attempts: u32,
    pub timeout_ms: u64,
}

/// The browser or page became unusable mid-run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session terminated: {message}")]
pub struct SessionFatalError {
    pub message: String,
}

impl SessionFatalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricComputationError {
    #[error("{metric} produced a non-finite value")]
    NonFinite { metric: MetricKey },

    #[error("{metric} = {value} is outside [0, {max}]")]
    OutOfRange {
        metric: MetricKey,
        value: f64,
        max: f64,
    },

    #[error("{field} has {len} characters (limit {limit})")]
    InputTooLong {
        field: &'static str,
        len: usize,
        limit: usize,
    },
}

/// Outcome of a failed `ChatSession::ask`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AskError {
    /// Per-question; the session stays usable.
    #[error(transparent)]
    Timeout(#[from] ResponseTimeoutError),
    /// Session-wide; nothing more can be asked.
    #[error(transparent)]
    Fatal(#[from] SessionFatalError),
}

/// Why a run stopped before every question was answered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunAbort {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    SessionFatal(#[from] SessionFatalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAbortKind {
    Auth,
    SessionFatal,
}

impl RunAbort {
    pub fn kind(&self) -> RunAbortKind {
        match self {
            RunAbort::Auth(_) => RunAbortKind::Auth,
            RunAbort::SessionFatal(_) => RunAbortKind::SessionFatal,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("unsupported dataset format for {path} (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String },

    #[error("row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row}: field '{field}' must be text, got {got}")]
    InvalidCell {
        row: usize,
        field: &'static str,
        got: String,
    },

    #[error("dataset {path} has no rows")]
    Empty { path: String },
}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_error_display_is_transparent() {
        let timeout: AskError = ResponseTimeoutError {
            attempts: 3,
            timeout_ms: 20_000,
        }
        .into();
        assert_eq!(
            timeout.to_string(),
            "no response within 20000ms after 3 attempt(s)"
        );

        let fatal: AskError = SessionFatalError::new("page crashed").into();
        assert_eq!(fatal.to_string(), "session terminated: page crashed");
    }

    #[test]
    fn run_abort_reports_its_kind() {
        let abort: RunAbort = AuthError::new("bad password").into();
        assert_eq!(abort.kind(), RunAbortKind::Auth);
        assert_eq!(abort.to_string(), "authentication failed: bad password");

        let abort: RunAbort = SessionFatalError::new("gone").into();
        assert_eq!(abort.kind(), RunAbortKind::SessionFatal);
    }

    #[test]
    fn metric_error_names_the_metric() {
        let err = MetricComputationError::OutOfRange {
            metric: MetricKey::FuzzyScore,
            value: 140.0,
            max: 100.0,
        };
        assert_eq!(err.to_string(), "fuzzy_score = 140 is outside [0, 100]");
    }
}
