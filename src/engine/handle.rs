//! Single-owner engine task.
//!
//! The engine lives on one blocking task and is only reached through queued
//! commands, so scheduled ticks, forced steps, inputs and queries never
//! overlap.

use super::{ExecutionEngine, ExecutionSnapshot};
use crate::control::LogLevel;
use crate::error::{EngineError, InputError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Pending commands the owner task will accept before senders wait.
const ENGINE_QUEUE_DEPTH: usize = 32;

enum EngineCommand {
    Tick {
        reply: oneshot::Sender<()>,
    },
    Input {
        command: String,
        reply: oneshot::Sender<Result<(), InputError>>,
    },
    Snapshot {
        reply: oneshot::Sender<ExecutionSnapshot>,
    },
    LogLevel {
        reply: oneshot::Sender<LogLevel>,
    },
    SetLogLevel {
        level: LogLevel,
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable sender side of the engine owner task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Move `engine` onto its owner task.
    ///
    /// The task ends once every handle has been dropped.
    pub fn spawn<E: ExecutionEngine>(engine: E) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(ENGINE_QUEUE_DEPTH);
        let owner = tokio::task::spawn_blocking(move || run_owner(engine, rx));
        (Self { tx }, owner)
    }

    pub async fn tick(&self) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::Tick { reply }).await
    }

    /// Forward an input command; the inner result is the executer's verdict.
    pub async fn input(
        &self,
        command: impl Into<String>,
    ) -> Result<Result<(), InputError>, EngineError> {
        let command = command.into();
        self.request(|reply| EngineCommand::Input { command, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<ExecutionSnapshot, EngineError> {
        self.request(|reply| EngineCommand::Snapshot { reply }).await
    }

    pub async fn log_level(&self) -> Result<LogLevel, EngineError> {
        self.request(|reply| EngineCommand::LogLevel { reply }).await
    }

    pub async fn set_log_level(&self, level: LogLevel) -> Result<(), EngineError> {
        self.request(|reply| EngineCommand::SetLogLevel { level, reply })
            .await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| EngineError::Unavailable)?;
        reply_rx.await.map_err(|_| EngineError::Unavailable)
    }
}

fn run_owner<E: ExecutionEngine>(mut engine: E, mut rx: mpsc::Receiver<EngineCommand>) {
    debug!("Engine owner started");
    while let Some(command) = rx.blocking_recv() {
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            EngineCommand::Tick { reply } => {
                engine.tick();
                let _ = reply.send(());
            }
            EngineCommand::Input { command, reply } => {
                let _ = reply.send(engine.input(&command));
            }
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(engine.snapshot());
            }
            EngineCommand::LogLevel { reply } => {
                let _ = reply.send(engine.log_level());
            }
            EngineCommand::SetLogLevel { level, reply } => {
                engine.set_log_level(level);
                let _ = reply.send(());
            }
        }
    }
    debug!("Engine owner stopped");
}
