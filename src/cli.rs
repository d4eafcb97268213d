//! Command-line interface for the agent binary.

use crate::config::{AgentConfiguration, ConfigLoader, RuntimeConfig};
use crate::error::AgentError;
use clap::Parser;
use std::path::PathBuf;

/// AbuSim agent - rule executer controlled by the simulation coordinator
#[derive(Parser, Debug)]
#[command(name = "abusim-agent")]
#[command(about = "Simulation agent controlled by the AbuSim coordinator")]
pub struct Cli {
    /// Agent configuration as a JSON string
    #[arg(env = "ABUSIM_AGENT_CONFIG", conflicts_with = "config_file")]
    pub config: Option<String>,

    /// Read the agent configuration from a JSON file instead
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Runtime settings file (coordinator address, logging)
    #[arg(long)]
    pub runtime_config: Option<PathBuf>,

    /// Coordinator address, overrides the runtime settings
    #[arg(long)]
    pub coordinator: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,
}

impl Cli {
    /// Resolve the agent configuration blob and deserialize it.
    pub fn agent_configuration(&self) -> Result<AgentConfiguration, AgentError> {
        let blob = match (&self.config, &self.config_file) {
            (Some(blob), _) => blob.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                AgentError::ConfigError(format!(
                    "Failed to read config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            (None, None) => {
                return Err(AgentError::ConfigError(
                    "Config not found, exiting".to_string(),
                ))
            }
        };
        AgentConfiguration::from_json(&blob)
    }

    /// Load runtime settings and apply command-line overrides.
    pub fn runtime_config(&self) -> Result<RuntimeConfig, AgentError> {
        let mut runtime = ConfigLoader::load(self.runtime_config.as_deref())?;
        if let Some(address) = &self.coordinator {
            runtime.coordinator.address = address.clone();
        }
        if let Some(level) = &self.log_level {
            runtime.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            runtime.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            runtime.logging.output = output.clone();
        }
        Ok(runtime)
    }
}
