//! Configuration
//!
//! Two layers feed the agent:
//!
//! - [`AgentConfiguration`]: the JSON blob describing this agent (identity,
//!   memory, rules, peers, tick). Loaded once, immutable afterwards.
//! - [`RuntimeConfig`]: process settings (coordinator address, logging),
//!   composed by [`ConfigLoader`] from defaults, an optional file and the
//!   `ABUSIM_*` environment.

mod loader;

pub use loader::ConfigLoader;

use crate::error::AgentError;
use crate::logging::LoggingConfig;
use crate::memory::MemoryItems;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coordinator address used when nothing else is configured.
pub const DEFAULT_COORDINATOR_ADDRESS: &str = "abusim-coordinator:5001";

/// Agent descriptor supplied at process start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfiguration {
    /// Agent identity, sent to the coordinator in the handshake.
    pub name: String,

    /// Memory controller kind (only "basic" is defined).
    #[serde(default = "default_memory_controller")]
    pub memory_controller: String,

    /// Initial memory: kind name -> resource name -> initialization values.
    #[serde(default)]
    pub memory: MemoryItems,

    /// Rule definitions, opaque to the agent.
    #[serde(default)]
    pub rules: Vec<String>,

    /// Peer agent endpoints.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Interval between scheduled ticks, in milliseconds on the wire.
    #[serde(with = "duration_millis", default = "default_tick")]
    pub tick: Duration,
}

fn default_memory_controller() -> String {
    "basic".to_string()
}

fn default_tick() -> Duration {
    Duration::from_secs(1)
}

impl AgentConfiguration {
    /// Deserialize the configuration blob.
    pub fn from_json(blob: &str) -> Result<Self, AgentError> {
        let config: AgentConfiguration = serde_json::from_str(blob)
            .map_err(|e| AgentError::ConfigError(format!("Bad config deserialization: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AgentError> {
        if self.name.trim().is_empty() {
            return Err(AgentError::ConfigError(
                "Agent name must not be empty".to_string(),
            ));
        }
        if self.tick.is_zero() {
            return Err(AgentError::ConfigError(
                "Tick interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Coordinator connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default = "default_coordinator_address")]
    pub address: String,
}

fn default_coordinator_address() -> String {
    DEFAULT_COORDINATOR_ADDRESS.to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            address: default_coordinator_address(),
        }
    }
}

/// Process-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
