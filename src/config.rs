//! Configuration for the registry core

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, Result};

fn default_polling_interval() -> u64 {
    5
}

/// Registry configuration consumed by the components cache.
///
/// Supplied by the surrounding registry process, usually loaded from the
/// registry's YAML configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root path in the storage backend under which components are published
    pub components_dir: String,

    /// Seconds between automatic cache refreshes
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u64,
}

impl RegistryConfig {
    /// Build a configuration with the default polling interval.
    pub fn new(components_dir: impl Into<String>) -> Self {
        Self {
            components_dir: components_dir.into(),
            polling_interval: default_polling_interval(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: RegistryConfig =
            serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration can drive the cache.
    pub fn validate(&self) -> Result<()> {
        if self.components_dir.trim().is_empty() {
            return Err(
                ConfigError::Invalid("components_dir must not be empty".to_string()).into(),
            );
        }
        if self.polling_interval == 0 {
            return Err(ConfigError::Invalid(
                "polling_interval must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
