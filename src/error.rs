//! Error types for the agent.
//!
//! Each layer owns a narrow error enum; [`AgentError`] aggregates them for the
//! startup path, where every failure is fatal.

use crate::memory::ValueKind;
use thiserror::Error;

/// Failures while building the initial resource store.
#[derive(Debug, Error, PartialEq)]
pub enum MemoryError {
    #[error("unknown memory controller \"{0}\"")]
    UnknownController(String),

    #[error("unknown type \"{0}\"")]
    UnknownKind(String),

    #[error("invalid {kind} value {value:?} for resource \"{resource}\"")]
    InvalidValue {
        kind: ValueKind,
        resource: String,
        value: String,
    },

    #[error("too many initialization values for {kind} resource \"{resource}\"")]
    TooManyValues { kind: ValueKind, resource: String },
}

/// Control connection failures.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("connection to coordinator failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    Closed,

    #[error("malformed {kind} message: {reason}")]
    Decode { kind: String, reason: String },

    #[error("message encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("unexpected response to init: {0}")]
    HandshakeRejected(String),
}

impl EndpointError {
    /// Whether the connection can no longer be used.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EndpointError::Io(_) | EndpointError::Closed)
    }
}

/// Rejection of an input command by the executer.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("empty input")]
    Empty,

    #[error("malformed assignment \"{0}\"")]
    Syntax(String),

    #[error("unknown resource \"{0}\"")]
    UnknownResource(String),

    #[error(transparent)]
    Value(#[from] MemoryError),
}

/// Failures reaching the engine owner task.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("execution engine is no longer running")]
    Unavailable,
}

/// Top-level agent error.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<config::ConfigError> for AgentError {
    fn from(err: config::ConfigError) -> Self {
        AgentError::ConfigError(err.to_string())
    }
}
