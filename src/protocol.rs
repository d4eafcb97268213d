//! Control Protocol
//!
//! Messages exchanged with the coordinator. Every kind is one variant of
//! [`Message`]; on the wire a message is a single JSON object per line,
//! `{"type": <kind>, "payload": <value>}`, with `payload` omitted for kinds
//! that carry none.

use crate::config::AgentConfiguration;
use crate::engine::ExecutionSnapshot;
use crate::error::EndpointError;
use serde::{Deserialize, Serialize};

/// Wire names of every message kind, requests and responses.
pub const MESSAGE_KINDS: [&str; 14] = [
    "INIT",
    "ACK",
    "MemoryQuery",
    "MemoryResult",
    "InputCommand",
    "InputResult",
    "DebugStatusQuery",
    "DebugStatusResult",
    "DebugStatusChange",
    "DebugStatusAck",
    "DebugStep",
    "DebugStepAck",
    "ConfigQuery",
    "ConfigResult",
];

/// Debug controls as carried on the wire.
///
/// `verbosity` stays a free-form name here so that an unknown level reaches
/// the dispatcher and can be rejected there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugStatus {
    pub paused: bool,
    pub verbosity: String,
}

/// Acknowledgment payload of a debug status change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugChangeOutcome {
    /// Set when the change was rejected; nothing was applied in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DebugChangeOutcome {
    pub fn accepted() -> Self {
        Self { error: None }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }
}

/// A protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    /// Handshake carrying the agent name.
    #[serde(rename = "INIT")]
    Init(String),
    #[serde(rename = "ACK")]
    Ack,
    MemoryQuery,
    MemoryResult(ExecutionSnapshot),
    InputCommand(String),
    /// Empty on success, otherwise the executer's rejection text.
    InputResult(String),
    DebugStatusQuery,
    DebugStatusResult(DebugStatus),
    DebugStatusChange(DebugStatus),
    DebugStatusAck(DebugChangeOutcome),
    DebugStep,
    DebugStepAck,
    ConfigQuery,
    ConfigResult(AgentConfiguration),
}

impl Message {
    /// Wire name of this message's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Init(_) => "INIT",
            Message::Ack => "ACK",
            Message::MemoryQuery => "MemoryQuery",
            Message::MemoryResult(_) => "MemoryResult",
            Message::InputCommand(_) => "InputCommand",
            Message::InputResult(_) => "InputResult",
            Message::DebugStatusQuery => "DebugStatusQuery",
            Message::DebugStatusResult(_) => "DebugStatusResult",
            Message::DebugStatusChange(_) => "DebugStatusChange",
            Message::DebugStatusAck(_) => "DebugStatusAck",
            Message::DebugStep => "DebugStep",
            Message::DebugStepAck => "DebugStepAck",
            Message::ConfigQuery => "ConfigQuery",
            Message::ConfigResult(_) => "ConfigResult",
        }
    }
}

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Message(Message),
    /// A well-formed envelope whose kind this agent does not know.
    Unrecognized(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

/// Encode `message` as one newline-terminated line.
pub fn encode(message: &Message) -> Result<String, EndpointError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Decode one line (without its terminator).
pub fn decode(line: &str) -> Result<Received, EndpointError> {
    let envelope: Envelope = serde_json::from_str(line).map_err(|e| EndpointError::Decode {
        kind: "<envelope>".to_string(),
        reason: e.to_string(),
    })?;
    if !MESSAGE_KINDS.contains(&envelope.kind.as_str()) {
        return Ok(Received::Unrecognized(envelope.kind));
    }
    serde_json::from_str(line)
        .map(Received::Message)
        .map_err(|e| EndpointError::Decode {
            kind: envelope.kind,
            reason: e.to_string(),
        })
}
