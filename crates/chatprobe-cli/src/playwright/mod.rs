//! Playwright browser automation through a long-lived Node process.

pub mod protocol;

use async_trait::async_trait;
use chatprobe_core::config::ChatSettings;
use chatprobe_core::session::{ChatDriver, DriverError, ReplySnapshot};
use protocol::{Op, Request};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

/// Time allowed for the bridge to exit after `close`.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct Bridge {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    // keeps the script on disk for the lifetime of the process
    _script_dir: tempfile::TempDir,
}

pub struct PlaywrightDriver {
    node: PathBuf,
    chat: ChatSettings,
    navigation_timeout: Duration,
    bridge: Option<Bridge>,
    next_id: u64,
}

impl PlaywrightDriver {
    pub fn new(node: PathBuf, chat: ChatSettings, navigation_timeout: Duration) -> Self {
        Self {
            node,
            chat,
            navigation_timeout,
            bridge: None,
            next_id: 0,
        }
    }

    fn spawn(&self) -> Result<Bridge, DriverError> {
        let script_dir = tempfile::tempdir()
            .map_err(|e| DriverError::Protocol(format!("cannot create bridge dir: {e}")))?;
        let script_path = script_dir.path().join("chatprobe-bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)
            .map_err(|e| DriverError::Protocol(format!("cannot write bridge script: {e}")))?;

        debug!(script = %script_path.display(), node = %self.node.display(), "starting Playwright bridge");

        let mut child = TokioCommand::new(&self.node)
            .arg(&script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DriverError::Protocol(format!("cannot start {}: {e}", self.node.display()))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::Protocol("bridge stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::Protocol("bridge stdout unavailable".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "chatprobe::bridge", "{line}");
                }
            });
        }

        Ok(Bridge {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            _script_dir: script_dir,
        })
    }

    async fn call(&mut self, op: Op<'_>) -> Result<Option<ReplySnapshot>, DriverError> {
        self.next_id += 1;
        let id = self.next_id;
        let line = protocol::encode(&Request { id, op })?;

        let bridge = self
            .bridge
            .as_mut()
            .ok_or_else(|| DriverError::Protocol("browser not open".into()))?;

        bridge
            .stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| DriverError::Disconnected(format!("bridge stdin closed: {e}")))?;
        bridge
            .stdin
            .flush()
            .await
            .map_err(|e| DriverError::Disconnected(format!("bridge stdin closed: {e}")))?;

        loop {
            let raw = bridge
                .stdout
                .next_line()
                .await
                .map_err(|e| DriverError::Disconnected(format!("bridge stdout failed: {e}")))?
                .ok_or_else(|| DriverError::Disconnected("bridge process exited".into()))?;
            let response = protocol::decode(&raw)?;
            if response.id < id {
                // reply to a request whose caller already gave up
                debug!(stale_id = response.id, id, "skipping stale bridge reply");
                continue;
            }
            if response.id != id {
                return Err(DriverError::Protocol(format!(
                    "bridge replied to request {} while {} was pending",
                    response.id, id
                )));
            }
            return response.into_result();
        }
    }
}

#[async_trait]
impl ChatDriver for PlaywrightDriver {
    async fn open(&mut self, headless: bool) -> Result<(), DriverError> {
        if self.bridge.is_none() {
            self.bridge = Some(self.spawn()?);
        }
        let url = self.chat.url.clone();
        let selectors = self.chat.selectors.clone();
        let navigation_timeout_ms = u64::try_from(self.navigation_timeout.as_millis()).unwrap_or(u64::MAX);
        self.call(Op::Open {
            url: &url,
            headless,
            navigation_timeout_ms,
            selectors: &selectors,
        })
        .await?;
        info!(url = %url, headless, "chat page loaded");
        Ok(())
    }

    async fn login(
        &mut self,
        username: &str,
        password: &str,
        wait: Duration,
    ) -> Result<(), DriverError> {
        let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self.call(Op::Login {
            username,
            password,
            wait_ms,
        })
        .await?;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<ReplySnapshot, DriverError> {
        self.call(Op::Snapshot)
            .await?
            .ok_or_else(|| DriverError::Protocol("snapshot reply without snapshot".into()))
    }

    async fn submit(&mut self, question: &str) -> Result<(), DriverError> {
        self.call(Op::Submit { question }).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if self.bridge.is_none() {
            return Ok(());
        }
        let result = self.call(Op::Close).await;
        if let Some(mut bridge) = self.bridge.take() {
            drop(bridge.stdin);
            match tokio::time::timeout(SHUTDOWN_GRACE, bridge.child.wait()).await {
                Ok(Ok(status)) => debug!(%status, "bridge exited"),
                Ok(Err(e)) => warn!(error = %e, "failed waiting for bridge"),
                Err(_) => {
                    warn!("bridge did not exit in time, killing it");
                    let _ = bridge.child.kill().await;
                }
            }
        }
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_script_handles_every_op() {
        for op in ["'open'", "'login'", "'snapshot'", "'submit'", "'close'"] {
            assert!(BRIDGE_SCRIPT.contains(&format!("case {op}")), "{op}");
        }
    }

    #[test]
    fn bridge_login_steps_share_the_login_deadline() {
        let login = &BRIDGE_SCRIPT[BRIDGE_SCRIPT.find("async function login").unwrap()
            ..BRIDGE_SCRIPT.find("async function snapshot").unwrap()];
        assert_eq!(login.matches("timeout: left()").count(), 4);
        assert!(login.contains("not found within"));
    }

    #[tokio::test]
    async fn calls_before_open_are_protocol_errors() {
        let mut driver = PlaywrightDriver::new(
            PathBuf::from("node"),
            ChatSettings::default(),
            Duration::from_secs(1),
        );
        assert!(matches!(driver.snapshot().await, Err(DriverError::Protocol(_))));
        assert!(driver.close().await.is_ok());
    }

    #[tokio::test]
    async fn missing_node_binary_is_reported() {
        let mut driver = PlaywrightDriver::new(
            PathBuf::from("/nonexistent/chatprobe-node"),
            ChatSettings::default(),
            Duration::from_secs(1),
        );
        let err = driver.open(true).await.unwrap_err();
        assert!(err.to_string().contains("cannot start"), "{err}");
    }
}
