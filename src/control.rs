//! Shared control state between the message dispatcher and the execution loop.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Executer log verbosity, ordered from most to least severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LogLevel {
    Fatal,
    #[default]
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Every level, in severity order.
    const ALL: [LogLevel; 5] = [
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    /// Wire name of the level.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Fatal => "Fatal",
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
        }
    }

    /// Look up a level by its wire name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.name() == name)
    }

    /// Whether a message at `level` is emitted under this verbosity.
    pub fn allows(self, level: LogLevel) -> bool {
        level <= self
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Point-in-time view of the debug controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlStatus {
    pub paused: bool,
    pub verbosity: LogLevel,
}

/// Pause flag shared by the dispatcher (single writer) and the execution loop.
#[derive(Debug, Default)]
pub struct ControlState {
    paused: RwLock<bool>,
}

impl ControlState {
    pub fn new(paused: bool) -> Self {
        Self {
            paused: RwLock::new(paused),
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.read()
    }

    pub fn set_paused(&self, paused: bool) {
        *self.paused.write() = paused;
    }
}
