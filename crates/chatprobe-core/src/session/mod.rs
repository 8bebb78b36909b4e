//! Chat session state machine.
//!
//! ```text
//! NotStarted --authenticate--> Authenticated --ask--> AwaitingResponse
//!     AwaitingResponse --reply--> ResponseReady --> Authenticated
//!     AwaitingResponse --timeout, retries left--> AwaitingResponse
//!     AwaitingResponse --retries exhausted--> Authenticated (question failed)
//!     any --auth failure / lost page--> Failed (terminal)
//! ```
//!
//! Every submission eventually owns one reply block. Blocks still owed to an
//! earlier question are waited out before the next question is submitted,
//! so a slow reply is never captured as the answer to a later question.

pub mod driver;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use crate::config::SessionPolicy;
pub use driver::{ChatDriver, DriverError, ReplySnapshot};

use crate::errors::{AskError, AuthError, ResponseTimeoutError, SessionFatalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Extra time granted on top of the login wait for the driver round-trip.
const LOGIN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Authenticated,
    AwaitingResponse,
    ResponseReady,
    Failed,
}

/// Submissions made for one question.
#[derive(Debug, Default)]
struct Submissions {
    /// Reply count before the first submission.
    start: Option<usize>,
    count: usize,
}

impl Submissions {
    fn owed_through(&self) -> Option<usize> {
        self.start.map(|start| start + self.count)
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub headless: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>, headless: bool) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            headless,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("headless", &self.headless)
            .finish()
    }
}

pub struct ChatSession<D: ChatDriver> {
    driver: D,
    policy: SessionPolicy,
    state: SessionState,
    closed: bool,
    /// Reply count at which every submission made so far has its block.
    owed_through: Option<usize>,
}

impl<D: ChatDriver> ChatSession<D> {
    pub fn new(driver: D, policy: SessionPolicy) -> Self {
        Self {
            driver,
            policy,
            state: SessionState::NotStarted,
            closed: false,
            owed_through: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }

    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<(), AuthError> {
        if self.state != SessionState::NotStarted {
            return Err(AuthError::new(format!(
                "authenticate called in state {:?}",
                self.state
            )));
        }

        match self.login(credentials).await {
            Ok(()) => {
                info!(username = %credentials.username, "logged in");
                self.transition(SessionState::Authenticated);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.transition(SessionState::Failed);
                Err(e)
            }
        }
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<(), AuthError> {
        let nav = self.policy.navigation_timeout();
        match tokio::time::timeout(nav, self.driver.open(credentials.headless)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(AuthError::new(format!("could not open chat page: {e}"))),
            Err(_) => {
                return Err(AuthError::new(format!(
                    "chat page did not load within {}ms",
                    self.policy.navigation_timeout_ms
                )))
            }
        }

        let wait = self.policy.login_timeout();
        let login = self
            .driver
            .login(&credentials.username, &credentials.password, wait);
        match tokio::time::timeout(wait + LOGIN_GRACE, login).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(DriverError::Timeout(_))) | Err(_) => Err(AuthError::new(format!(
                "chat input did not appear within {}ms of submitting credentials",
                self.policy.login_timeout_ms
            ))),
            Ok(Err(e)) => Err(AuthError::new(e.to_string())),
        }
    }

    /// Submit `question` and return the bot's reply text.
    ///
    /// Timeouts are retried up to `max_retries` times and then reported as
    /// [`ResponseTimeoutError`]; the session stays usable. A lost page is
    /// reported as [`SessionFatalError`] and is permanent.
    pub async fn ask(&mut self, question: &str) -> Result<String, AskError> {
        match self.state {
            SessionState::Authenticated => {}
            SessionState::Failed => {
                return Err(SessionFatalError::new("session is no longer usable").into())
            }
            other => {
                return Err(
                    SessionFatalError::new(format!("cannot ask in state {other:?}")).into(),
                )
            }
        }

        self.transition(SessionState::AwaitingResponse);
        match self.settle_owed_replies().await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(self.fail(e)),
            Err(e) => warn!(error = %e, "could not check for earlier replies"),
        }

        let attempts = self.policy.max_retries.saturating_add(1);
        let mut round = Submissions::default();
        for attempt in 1..=attempts {
            self.transition(SessionState::AwaitingResponse);
            let result = self.attempt(question, &mut round).await;
            self.owed_through = round.owed_through();
            match result {
                Ok(text) => {
                    self.transition(SessionState::ResponseReady);
                    debug!(attempt, chars = text.len(), "reply captured");
                    self.transition(SessionState::Authenticated);
                    return Ok(text);
                }
                Err(e) if e.is_fatal() => return Err(self.fail(e)),
                Err(e) => {
                    warn!(attempt, max_attempts = attempts, error = %e, "no usable reply");
                }
            }
        }

        self.transition(SessionState::Authenticated);
        Err(ResponseTimeoutError {
            attempts,
            timeout_ms: self.policy.response_timeout_ms,
        }
        .into())
    }

    fn fail(&mut self, e: DriverError) -> AskError {
        self.transition(SessionState::Failed);
        SessionFatalError::new(e.to_string()).into()
    }

    /// Wait out reply blocks still owed to earlier submissions. Bounded by
    /// one response timeout; blocks that never arrive are given up on.
    async fn settle_owed_replies(&mut self) -> Result<(), DriverError> {
        let Some(owed) = self.owed_through.take() else {
            return Ok(());
        };
        let snap = self.driver.snapshot().await?;
        if snap.reply_count >= owed && !snap.typing {
            return Ok(());
        }
        let current = snap.reply_count;
        debug!(current, owed, "waiting for replies to earlier submissions");

        let limit = self.policy.response_timeout();
        match tokio::time::timeout(limit, self.await_reply(owed)).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => {
                warn!(
                    missing = owed.saturating_sub(current),
                    "earlier submissions never got a reply, continuing"
                );
                Ok(())
            }
        }
    }

    async fn attempt(&mut self, question: &str, round: &mut Submissions) -> Result<String, DriverError> {
        let baseline = self.driver.snapshot().await?.reply_count;
        self.driver.submit(question).await?;
        round.start.get_or_insert(baseline);
        round.count += 1;

        let limit = self.policy.response_timeout();
        match tokio::time::timeout(limit, self.await_reply(baseline + 1)).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::Timeout(format!(
                "no complete reply within {}ms",
                self.policy.response_timeout_ms
            ))),
        }
    }

    /// Poll until at least `min_count` reply blocks exist and the newest one
    /// stops changing.
    async fn await_reply(&mut self, min_count: usize) -> Result<String, DriverError> {
        let poll = self.policy.poll_interval();
        let needed = self.policy.stable_polls.max(1);
        let mut last: Option<String> = None;
        let mut stable = 0u32;

        loop {
            tokio::time::sleep(poll).await;
            let snap = self.driver.snapshot().await?;

            let text = snap
                .last_reply
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty());
            let Some(text) = text.filter(|_| snap.reply_count >= min_count && !snap.typing) else {
                last = None;
                stable = 0;
                continue;
            };

            if last.as_deref() == Some(text) {
                stable += 1;
            } else {
                last = Some(text.to_string());
                stable = 1;
            }
            if stable >= needed {
                return Ok(last.unwrap_or_default());
            }
        }
    }

    /// Release the browser. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.driver.close().await {
            warn!(error = %e, "failed to close browser cleanly");
        }
    }
}
