//! Newline-delimited JSON spoken with the Node bridge.
//!
//! Every request carries an `id`; the bridge echoes it so replies to a
//! request abandoned by a timeout can be recognised and skipped.

use chatprobe_core::config::ChatSelectors;
use chatprobe_core::session::{DriverError, ReplySnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op<'a> {
    Open {
        url: &'a str,
        headless: bool,
        navigation_timeout_ms: u64,
        selectors: &'a ChatSelectors,
    },
    Login {
        username: &'a str,
        password: &'a str,
        wait_ms: u64,
    },
    Snapshot,
    Submit {
        question: &'a str,
    },
    Close,
}

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub op: Op<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Rejected,
    Disconnected,
    Protocol,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeError {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<BridgeError>,
    #[serde(default)]
    pub snapshot: Option<ReplySnapshot>,
}

impl From<BridgeError> for DriverError {
    fn from(e: BridgeError) -> Self {
        match e.kind {
            ErrorKind::Timeout => DriverError::Timeout(e.message),
            ErrorKind::Rejected => DriverError::Rejected(e.message),
            ErrorKind::Disconnected => DriverError::Disconnected(e.message),
            ErrorKind::Protocol => DriverError::Protocol(e.message),
        }
    }
}

impl Response {
    pub fn into_result(self) -> Result<Option<ReplySnapshot>, DriverError> {
        if self.ok {
            return Ok(self.snapshot);
        }
        Err(self
            .error
            .map(DriverError::from)
            .unwrap_or_else(|| DriverError::Protocol("bridge reported failure without detail".into())))
    }
}

pub fn encode(req: &Request<'_>) -> Result<String, DriverError> {
    let mut line = serde_json::to_string(req)
        .map_err(|e| DriverError::Protocol(format!("cannot encode request: {e}")))?;
    line.push('\n');
    Ok(line)
}

pub fn decode(line: &str) -> Result<Response, DriverError> {
    serde_json::from_str(line)
        .map_err(|e| DriverError::Protocol(format!("unreadable bridge reply {line:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_flat_tagged_objects() {
        let line = encode(&Request {
            id: 7,
            op: Op::Submit { question: "Hi?" },
        })
        .unwrap();
        assert!(line.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(v, serde_json::json!({"id": 7, "op": "submit", "question": "Hi?"}));

        let line = encode(&Request { id: 1, op: Op::Snapshot }).unwrap();
        assert_eq!(line, "{\"id\":1,\"op\":\"snapshot\"}\n");
    }

    #[test]
    fn open_carries_selectors() {
        let selectors = ChatSelectors::default();
        let line = encode(&Request {
            id: 1,
            op: Op::Open {
                url: "https://chat.example",
                headless: true,
                navigation_timeout_ms: 30_000,
                selectors: &selectors,
            },
        })
        .unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["selectors"]["reply_container"], "div.prose");
        assert_eq!(v["headless"], true);
    }

    #[test]
    fn snapshot_reply_decodes() {
        let r = decode(
            r#"{"id":3,"ok":true,"snapshot":{"reply_count":2,"last_reply":"Paris.","typing":false}}"#,
        )
        .unwrap();
        assert_eq!(r.id, 3);
        let snap = r.into_result().unwrap().unwrap();
        assert_eq!(snap.reply_count, 2);
        assert_eq!(snap.last_reply.as_deref(), Some("Paris."));
    }

    #[test]
    fn error_kinds_map_to_driver_errors() {
        let r = decode(r#"{"id":4,"ok":false,"error":{"kind":"disconnected","message":"page crashed"}}"#)
            .unwrap();
        let err = r.into_result().unwrap_err();
        assert_eq!(err, DriverError::Disconnected("page crashed".into()));
        assert!(err.is_fatal());

        let r = decode(r#"{"id":5,"ok":false}"#).unwrap();
        assert!(matches!(r.into_result(), Err(DriverError::Protocol(_))));
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        assert!(matches!(decode("Debugger attached."), Err(DriverError::Protocol(_))));
    }
}
