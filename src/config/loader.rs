//! Runtime settings loader: defaults, optional file, then ABUSIM_* environment.

use super::{RuntimeConfig, DEFAULT_COORDINATOR_ADDRESS};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::path::Path;

/// Configuration loader for [`RuntimeConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings with precedence: defaults (lowest) -> file -> environment (highest).
    ///
    /// Environment keys use the `ABUSIM_` prefix and `__` for nesting,
    /// e.g. `ABUSIM_COORDINATOR__ADDRESS`.
    pub fn load(path: Option<&Path>) -> Result<RuntimeConfig, ConfigError> {
        let mut builder = Self::builder_with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = Self::add_environment(builder);
        builder.build()?.try_deserialize()
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("coordinator.address", DEFAULT_COORDINATOR_ADDRESS)?
            .set_default("logging.enabled", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "text")?
            .set_default("logging.output", "stderr")
    }

    fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix("ABUSIM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }
}
