use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the chat page currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    /// Number of bot reply blocks rendered so far.
    pub reply_count: usize,
    /// Text of the newest reply block only.
    pub last_reply: Option<String>,
    /// The UI still signals that the bot is composing.
    pub typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("browser disconnected: {0}")]
    Disconnected(String),

    #[error("driver protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// Fatal errors leave the page unusable for every later question.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Disconnected(_) | DriverError::Protocol(_))
    }
}

/// Low-level page operations a chat session is built from.
///
/// Every call must be safe to repeat: the session resubmits a question
/// after a timeout and re-reads the page on every poll.
#[async_trait]
pub trait ChatDriver: Send {
    /// Launch the browser and load the chat page.
    async fn open(&mut self, headless: bool) -> Result<(), DriverError>;

    /// Fill and submit the login form, then wait up to `wait` for the chat input.
    async fn login(&mut self, username: &str, password: &str, wait: Duration)
        -> Result<(), DriverError>;

    async fn snapshot(&mut self) -> Result<ReplySnapshot, DriverError>;

    async fn submit(&mut self, question: &str) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}
