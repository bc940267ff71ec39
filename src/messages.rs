//! Wire envelopes exchanged between a player and its execution context.
//!
//! Outbound (player → sandbox) is a [`RunRequest`]; inbound (sandbox →
//! player) is an [`InboundMessage`], decoded once at the boundary and then
//! matched exhaustively.

use crate::error::ProtocolError;
use crate::extended_json::{self, Value};
use crate::file_map::FileMap;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Tag stamped on every outbound envelope so the sandbox can tell ours apart
pub const SOURCE_TAG: &str = "rnwp";

/// "Run this file set" - the only outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub file_map: FileMap,
    pub entry: String,
    pub source: String,
}

impl RunRequest {
    pub fn new(file_map: FileMap, entry: String) -> Self {
        Self {
            file_map,
            entry,
            source: SOURCE_TAG.to_string(),
        }
    }

    /// Serialize for posting across the frame boundary.
    pub fn to_message(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Read an envelope posted to the sandbox, rejecting foreign sources.
    pub fn from_message(text: &str) -> Result<Self, ProtocolError> {
        let request: RunRequest = serde_json::from_str(text)?;
        if request.source != SOURCE_TAG {
            return Err(ProtocolError::ForeignSource(request.source));
        }
        Ok(request)
    }
}

/// Where a console call happened in the user's code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ConsoleCommand {
    Log {
        data: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<SourceLocation>,
    },
    Clear,
}

impl ConsoleCommand {
    pub fn log(data: Vec<Value>) -> Self {
        ConsoleCommand::Log {
            data,
            location: None,
        }
    }

    /// Read a console command posted by the execution context shim.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        extended_json::parse(text)
    }

    /// The logged values joined by spaces, as a console would print them.
    pub fn render(&self) -> String {
        match self {
            ConsoleCommand::Log { data, .. } => data
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            ConsoleCommand::Clear => String::new(),
        }
    }
}

/// Events an execution context reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundMessage {
    Ready { id: SessionId },
    Error { id: SessionId, payload: String },
    Console { id: SessionId, payload: ConsoleCommand },
}

impl InboundMessage {
    pub fn session_id(&self) -> &SessionId {
        match self {
            InboundMessage::Ready { id }
            | InboundMessage::Error { id, .. }
            | InboundMessage::Console { id, .. } => id,
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        extended_json::stringify(self)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        extended_json::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_request_shape() {
        let request = RunRequest::new(FileMap::single("index.js", "1"), "index.js".into());
        let value: serde_json::Value = serde_json::from_str(&request.to_message().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"fileMap": {"index.js": "1"}, "entry": "index.js", "source": "rnwp"})
        );
    }

    #[test]
    fn test_foreign_source_rejected() {
        let text = r#"{"fileMap":{},"entry":"a.js","source":"devtools"}"#;
        assert!(matches!(
            RunRequest::from_message(text),
            Err(ProtocolError::ForeignSource(source)) if source == "devtools"
        ));
    }

    #[test]
    fn test_decode_each_kind() {
        assert_eq!(
            InboundMessage::decode(r#"{"type":"ready","id":"42"}"#).unwrap(),
            InboundMessage::Ready { id: "42".into() }
        );
        assert_eq!(
            InboundMessage::decode(r#"{"type":"error","id":"42","payload":"boom"}"#).unwrap(),
            InboundMessage::Error { id: "42".into(), payload: "boom".into() }
        );
        let console = InboundMessage::decode(
            r#"{"type":"console","id":"42","payload":{"command":"log","data":["n =",{"$extended":"NaN"}]}}"#,
        )
        .unwrap();
        match console {
            InboundMessage::Console { payload, .. } => assert_eq!(payload.render(), "n = NaN"),
            other => panic!("expected console, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_command() {
        let message = InboundMessage::decode(
            r#"{"type":"console","id":"1","payload":{"command":"clear"}}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            InboundMessage::Console { id: "1".into(), payload: ConsoleCommand::Clear }
        );
    }

    #[test]
    fn test_malformed_messages_fail_to_decode() {
        assert!(InboundMessage::decode("not json").is_err());
        assert!(InboundMessage::decode(r#"{"type":"reload","id":"1"}"#).is_err());
        assert!(InboundMessage::decode(r#"{"type":"ready"}"#).is_err());
        assert!(InboundMessage::decode(r#"{"type":"console","id":"1","payload":{"command":"log","data":[{"$extended":"bogus"}]}}"#).is_err());
    }

    #[test]
    fn test_encode_keeps_special_values() {
        let message = InboundMessage::Console {
            id: "7".into(),
            payload: ConsoleCommand::log(vec![Value::Number(f64::INFINITY), Value::Undefined]),
        };
        let text = message.encode().unwrap();
        assert!(text.contains(r#"{"$extended":"Infinity"}"#));
        assert_eq!(InboundMessage::decode(&text).unwrap(), message);
    }
}
