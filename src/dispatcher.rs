//! Message Dispatcher
//!
//! Reads coordinator requests one at a time and answers each with exactly one
//! response. Read failures end the loop; write failures are logged and the
//! loop moves on to the next read.

use crate::config::AgentConfiguration;
use crate::control::{ControlState, ControlStatus, LogLevel};
use crate::endpoint::ControlEndpoint;
use crate::engine::EngineHandle;
use crate::error::EngineError;
use crate::protocol::{DebugChangeOutcome, DebugStatus, Message, Received};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Dispatcher {
    endpoint: Arc<ControlEndpoint>,
    engine: EngineHandle,
    control: Arc<ControlState>,
    config: Arc<AgentConfiguration>,
}

impl Dispatcher {
    pub fn new(
        endpoint: Arc<ControlEndpoint>,
        engine: EngineHandle,
        control: Arc<ControlState>,
        config: Arc<AgentConfiguration>,
    ) -> Self {
        Self {
            endpoint,
            engine,
            control,
            config,
        }
    }

    /// Serve requests until the connection is lost.
    pub async fn run(self) {
        info!(agent = %self.config.name, "Handling coordinator messages");
        loop {
            let request = match self.endpoint.read_message().await {
                Ok(Received::Message(message)) => message,
                Ok(Received::Unrecognized(kind)) => {
                    info!(kind = %kind, "Unknown message type");
                    continue;
                }
                Err(e) if e.is_terminal() => {
                    warn!(error = %e, "Control connection lost, no longer answering requests");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Discarding malformed message");
                    continue;
                }
            };

            let Some(response) = self.respond(request).await else {
                continue;
            };
            if let Err(e) = self.endpoint.write_message(&response).await {
                error!(kind = response.kind(), error = %e, "Failed to send response");
            }
        }
    }

    /// Compute the response to one request.
    ///
    /// Returns `None` for messages that are not requests, and when the engine
    /// can no longer be reached.
    pub async fn respond(&self, request: Message) -> Option<Message> {
        let kind = request.kind();
        debug!(kind, "Handling request");
        let response = match request {
            Message::MemoryQuery => self.engine.snapshot().await.map(Message::MemoryResult),
            Message::InputCommand(command) => self.engine.input(command).await.map(|verdict| {
                Message::InputResult(verdict.err().map(|e| e.to_string()).unwrap_or_default())
            }),
            Message::DebugStatusQuery => self
                .debug_status()
                .await
                .map(|status| Message::DebugStatusResult(to_wire(status))),
            Message::DebugStatusChange(status) => self
                .change_debug_status(status)
                .await
                .map(Message::DebugStatusAck),
            Message::DebugStep => self.engine.tick().await.map(|()| Message::DebugStepAck),
            Message::ConfigQuery => Ok(Message::ConfigResult(self.config.as_ref().clone())),
            other => {
                info!(kind = other.kind(), "Ignoring message that is not a request");
                return None;
            }
        };
        match response {
            Ok(response) => Some(response),
            Err(e) => {
                error!(kind, error = %e, "Request dropped");
                None
            }
        }
    }

    /// Current pause flag and the executer's live verbosity.
    pub async fn debug_status(&self) -> Result<ControlStatus, EngineError> {
        Ok(ControlStatus {
            paused: self.control.is_paused(),
            verbosity: self.engine.log_level().await?,
        })
    }

    /// Apply a status change; an unknown verbosity rejects the whole change.
    ///
    /// The pause flag is only written once the engine has taken the level.
    async fn change_debug_status(
        &self,
        status: DebugStatus,
    ) -> Result<DebugChangeOutcome, EngineError> {
        let Some(level) = LogLevel::from_name(&status.verbosity) else {
            warn!(verbosity = %status.verbosity, "Rejecting debug change with unknown verbosity");
            return Ok(DebugChangeOutcome::rejected(format!(
                "unknown verbosity \"{}\"",
                status.verbosity
            )));
        };
        self.engine.set_log_level(level).await?;
        self.control.set_paused(status.paused);
        info!(paused = status.paused, verbosity = %level, "Debug status changed");
        Ok(DebugChangeOutcome::accepted())
    }
}

fn to_wire(status: ControlStatus) -> DebugStatus {
    DebugStatus {
        paused: status.paused,
        verbosity: status.verbosity.name().to_string(),
    }
}
