//! Logging System
//!
//! Structured process logging with the `tracing` crate. Level, format and
//! destination come from [`LoggingConfig`], with `ABUSIM_LOG*` environment
//! overrides. This is independent of the executer verbosity carried by the
//! control protocol, which only gates what the executer itself emits.

use crate::error::AgentError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Resolve the log file path with precedence: ABUSIM_LOG_FILE env, config file, default.
///
/// The default lives in the platform state directory, one file per agent name.
pub fn resolve_log_file_path(
    config_file: Option<PathBuf>,
    agent: Option<&str>,
) -> Result<PathBuf, AgentError> {
    if let Ok(env_path) = std::env::var("ABUSIM_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    default_log_file_path(agent)
}

fn default_log_file_path(agent: Option<&str>) -> Result<PathBuf, AgentError> {
    let project_dirs = directories::ProjectDirs::from("", "abusim", "abusim-agent")
        .ok_or_else(|| {
            AgentError::ConfigError(
                "Could not determine platform state directory for log file".to_string(),
            )
        })?;
    let state_dir = project_dirs
        .state_dir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_dirs.data_local_dir().to_path_buf());
    let file_name = match agent {
        Some(name) if !name.is_empty() => format!("{}.log", sanitize_file_stem(name)),
        _ => "agent.log".to_string(),
    };
    Ok(state_dir.join(file_name))
}

fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stderr
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means use runtime default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
        }
    }
}

/// Initialize the global subscriber.
///
/// Priority order (highest to lowest):
/// 1. Environment variables (ABUSIM_LOG, ABUSIM_LOG_FORMAT, ABUSIM_LOG_OUTPUT)
/// 2. Configuration
/// 3. Defaults
pub fn init_logging(config: &LoggingConfig, agent: Option<&str>) -> Result<(), AgentError> {
    if !config.enabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .try_init()
            .map_err(|e| AgentError::ConfigError(format!("Failed to init logging: {}", e)))?;
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;

    let writer = if output.file {
        let log_file = resolve_log_file_path(config.file.clone(), agent)?;
        let file = Arc::new(open_log_file(&log_file)?);
        if output.stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        }
    } else if output.stdout {
        BoxMakeWriter::new(std::io::stdout)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };
    let use_color = config.color && !output.file;

    let registry = Registry::default().with(filter);
    let result = if format == LogFormat::Json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init()
    };
    result.map_err(|e| AgentError::ConfigError(format!("Failed to init logging: {}", e)))
}

fn open_log_file(log_file: &Path) -> Result<std::fs::File, AgentError> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AgentError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .map_err(|e| {
            AgentError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e))
        })
}

/// Build environment filter from ABUSIM_LOG or the configured level.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, AgentError> {
    if let Ok(filter) = EnvFilter::try_from_env("ABUSIM_LOG") {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| AgentError::ConfigError(format!("Invalid log level: {}", e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<LogFormat, AgentError> {
    match format {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(AgentError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

fn determine_format(config: &LoggingConfig) -> Result<LogFormat, AgentError> {
    if let Ok(format) = std::env::var("ABUSIM_LOG_FORMAT") {
        if let Ok(format) = parse_format(&format) {
            return Ok(format);
        }
    }
    parse_format(&config.format)
}

/// Output destinations
#[derive(Debug)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn determine_output(config: &LoggingConfig) -> Result<OutputDestinations, AgentError> {
    if let Ok(output) = std::env::var("ABUSIM_LOG_OUTPUT") {
        return parse_output_destinations(&output);
    }
    parse_output_destinations(&config.output)
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, AgentError> {
    match output {
        "stdout" => Ok(OutputDestinations {
            stdout: true,
            stderr: false,
            file: false,
        }),
        "stderr" => Ok(OutputDestinations {
            stdout: false,
            stderr: true,
            file: false,
        }),
        "file" => Ok(OutputDestinations {
            stdout: false,
            stderr: false,
            file: true,
        }),
        "file+stderr" => Ok(OutputDestinations {
            stdout: false,
            stderr: true,
            file: true,
        }),
        _ => Err(AgentError::ConfigError(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr', 'file' or 'file+stderr')",
            output
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logging_config() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert_eq!(config.output, "stderr");
        assert_eq!(config.file, None);
        assert!(config.color);
    }

    #[test]
    fn test_parse_output_destinations() {
        let out = parse_output_destinations("stdout").unwrap();
        assert!(out.stdout);
        assert!(!out.stderr);
        assert!(!out.file);

        let out = parse_output_destinations("file+stderr").unwrap();
        assert!(!out.stdout);
        assert!(out.stderr);
        assert!(out.file);

        assert!(parse_output_destinations("both").is_err());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("json").unwrap(), LogFormat::Json);
        assert_eq!(parse_format("text").unwrap(), LogFormat::Text);
        assert!(parse_format("xml").is_err());
    }

    #[test]
    fn test_resolve_log_file_path_config_wins_over_default() {
        let config = Some(PathBuf::from("/tmp/agent-config.log"));
        let path = resolve_log_file_path(config, Some("agent0")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/agent-config.log"));
    }

    #[test]
    fn test_default_log_file_is_named_after_agent() {
        let path = default_log_file_path(Some("agent/0")).unwrap();
        assert!(path.ends_with("agent_0.log"));
        let path = default_log_file_path(None).unwrap();
        assert!(path.ends_with("agent.log"));
    }
}
