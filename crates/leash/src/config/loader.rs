//! Configuration file loading for Leash
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{Config, ConfigError};

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        self.default_limits.validate()?;

        for (name, limits) in &self.profiles {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("profile has empty name".to_string()));
            }
            limits.validate().map_err(|e| {
                ConfigError::Invalid(format!("profile '{name}': {e}"))
            })?;
        }

        if let Some(key) = self.env.keys().find(|k| k.is_empty() || k.contains('=')) {
            return Err(ConfigError::Invalid(format!(
                "invalid environment variable name '{key}'"
            )));
        }

        Ok(())
    }
}
