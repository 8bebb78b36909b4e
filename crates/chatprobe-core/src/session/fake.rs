//! In-memory chat page for tests. Replies are scripted per submission.

use super::driver::{ChatDriver, DriverError, ReplySnapshot};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum OpenBehaviour {
    Load,
    /// Navigation fails outright.
    Fail(String),
    /// The page never finishes loading.
    Hang,
}

#[derive(Debug, Clone)]
pub enum LoginBehaviour {
    Accept,
    Reject(String),
    /// The login form is not on the page.
    NoForm(String),
    /// Never shows the chat input.
    Hang,
}

/// What the page does after one submission.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A complete reply block appears immediately.
    Answer(String),
    /// Nothing appears.
    Silent,
    /// One block that grows with every poll while the typing indicator is on.
    Streaming { chunks: Vec<String> },
    /// The block appears `after` the submission, whatever else the session
    /// is doing by then.
    Delayed { text: String, after: Duration },
    /// The page dies on submit.
    Disconnect,
}

impl ScriptedReply {
    pub fn answer(text: impl Into<String>) -> Self {
        ScriptedReply::Answer(text.into())
    }

    pub fn delayed(text: impl Into<String>, after: Duration) -> Self {
        ScriptedReply::Delayed {
            text: text.into(),
            after,
        }
    }
}

#[derive(Debug, Default)]
struct ScriptLog {
    opened: Option<bool>,
    submissions: Vec<String>,
    blocks: Vec<String>,
    close_calls: usize,
}

/// Shared view of what a [`ScriptedDriver`] saw, usable after the driver
/// has been moved into a session.
#[derive(Debug, Clone, Default)]
pub struct ScriptHandle(Arc<Mutex<ScriptLog>>);

impl ScriptHandle {
    fn with<T>(&self, f: impl FnOnce(&mut ScriptLog) -> T) -> T {
        let mut log = self.0.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut log)
    }

    pub fn submissions(&self) -> Vec<String> {
        self.with(|l| l.submissions.clone())
    }

    /// Reply blocks currently rendered on the page, oldest first.
    pub fn blocks(&self) -> Vec<String> {
        self.with(|l| l.blocks.clone())
    }

    pub fn close_calls(&self) -> usize {
        self.with(|l| l.close_calls)
    }

    pub fn opened_headless(&self) -> bool {
        self.with(|l| l.opened == Some(true))
    }

    pub fn was_opened(&self) -> bool {
        self.with(|l| l.opened.is_some())
    }
}

/// Scripted [`ChatDriver`]. Submissions beyond the script behave as
/// [`ScriptedReply::Silent`].
#[derive(Debug)]
pub struct ScriptedDriver {
    open: OpenBehaviour,
    login: LoginBehaviour,
    script: VecDeque<ScriptedReply>,
    log: ScriptHandle,
    streaming: VecDeque<String>,
    scheduled: Vec<(Instant, String)>,
    logged_in: bool,
    gone: bool,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            open: OpenBehaviour::Load,
            login: LoginBehaviour::Accept,
            script: VecDeque::new(),
            log: ScriptHandle::default(),
            streaming: VecDeque::new(),
            scheduled: Vec::new(),
            logged_in: false,
            gone: false,
        }
    }

    pub fn with_open(mut self, open: OpenBehaviour) -> Self {
        self.open = open;
        self
    }

    pub fn with_login(mut self, login: LoginBehaviour) -> Self {
        self.login = login;
        self
    }

    pub fn with_reply(mut self, reply: ScriptedReply) -> Self {
        self.script.push_back(reply);
        self
    }

    pub fn with_replies(mut self, replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        self.script.extend(replies);
        self
    }

    pub fn handle(&self) -> ScriptHandle {
        self.log.clone()
    }

    fn ensure_alive(&self) -> Result<(), DriverError> {
        if self.gone {
            return Err(DriverError::Disconnected("page closed".into()));
        }
        Ok(())
    }

    fn push_block(&self, text: String) {
        self.log.with(|l| l.blocks.push(text));
    }

    /// Render delayed blocks whose time has come, earliest first.
    fn release_due(&mut self) {
        let now = Instant::now();
        let mut due: Vec<(Instant, String)> = Vec::new();
        self.scheduled.retain(|(at, text)| {
            if *at <= now {
                due.push((*at, text.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        for (_, text) in due {
            self.push_block(text);
        }
    }

    fn advance_stream(&mut self) {
        if let Some(next) = self.streaming.pop_front() {
            self.log.with(|l| {
                if let Some(last) = l.blocks.last_mut() {
                    *last = next;
                }
            });
        }
    }
}

#[async_trait]
impl ChatDriver for ScriptedDriver {
    async fn open(&mut self, headless: bool) -> Result<(), DriverError> {
        self.ensure_alive()?;
        match &self.open {
            OpenBehaviour::Load => {
                self.log.with(|l| l.opened = Some(headless));
                Ok(())
            }
            OpenBehaviour::Fail(msg) => Err(DriverError::Protocol(msg.clone())),
            OpenBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn login(&mut self, _username: &str, _password: &str, _wait: Duration) -> Result<(), DriverError> {
        self.ensure_alive()?;
        if !self.log.was_opened() {
            return Err(DriverError::Protocol("login before open".into()));
        }
        match &self.login {
            LoginBehaviour::Accept => {
                self.logged_in = true;
                Ok(())
            }
            LoginBehaviour::Reject(msg) => Err(DriverError::Rejected(msg.clone())),
            LoginBehaviour::NoForm(msg) => Err(DriverError::Protocol(msg.clone())),
            LoginBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn snapshot(&mut self) -> Result<ReplySnapshot, DriverError> {
        self.ensure_alive()?;
        self.release_due();
        self.advance_stream();
        let blocks = self.log.blocks();
        Ok(ReplySnapshot {
            reply_count: blocks.len(),
            last_reply: blocks.last().cloned(),
            typing: !self.streaming.is_empty(),
        })
    }

    async fn submit(&mut self, question: &str) -> Result<(), DriverError> {
        self.ensure_alive()?;
        if !self.logged_in {
            return Err(DriverError::Protocol("chat input not available".into()));
        }
        self.log.with(|l| l.submissions.push(question.to_string()));

        match self.script.pop_front().unwrap_or(ScriptedReply::Silent) {
            ScriptedReply::Answer(text) => self.push_block(text),
            ScriptedReply::Silent => {}
            ScriptedReply::Streaming { chunks } => {
                let mut chunks: VecDeque<String> = chunks.into();
                if let Some(first) = chunks.pop_front() {
                    self.push_block(first);
                    self.streaming = chunks;
                }
            }
            ScriptedReply::Delayed { text, after } => {
                self.scheduled.push((Instant::now() + after, text));
            }
            ScriptedReply::Disconnect => {
                self.gone = true;
                return Err(DriverError::Disconnected("target page crashed".into()));
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.log.with(|l| l.close_calls += 1);
        self.gone = true;
        Ok(())
    }
}
