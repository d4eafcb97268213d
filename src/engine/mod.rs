//! Execution Engine
//!
//! The [`ExecutionEngine`] trait is the facade the agent drives: ticks, input
//! commands, state snapshots and log verbosity. Engines are synchronous and
//! never shared; [`EngineHandle`] moves one onto a dedicated owner task and
//! serializes every call through its command queue.

mod basic;
mod handle;

pub use basic::{Action, BasicExecuter};
pub use handle::EngineHandle;

use crate::control::LogLevel;
use crate::error::InputError;
use crate::memory::ResourceStore;
use serde::{Deserialize, Serialize};

/// Operations the agent needs from a rule executer.
pub trait ExecutionEngine: Send + 'static {
    /// Advance evaluation by one step.
    fn tick(&mut self);

    /// Hand an external command to the executer's input handler.
    fn input(&mut self, command: &str) -> Result<(), InputError>;

    /// Copy of the current memory and pending pool.
    fn snapshot(&self) -> ExecutionSnapshot;

    fn log_level(&self) -> LogLevel;

    fn set_log_level(&mut self, level: LogLevel);
}

/// One pending action, with its value rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolElem {
    pub resource: String,
    pub value: String,
}

/// Point-in-time copy of an executer's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub memory: ResourceStore,
    /// Action lists in pool order, one list per triggered rule.
    pub pool: Vec<Vec<PoolElem>>,
}
