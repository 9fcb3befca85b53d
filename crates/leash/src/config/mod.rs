use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::command::Command;
use crate::types::ResourceLimits;

mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../leash.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} limit '{value}': must be a positive number")]
    InvalidLimit { name: &'static str, value: String },

    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("profile '{0}' not found in configuration")]
    ProfileNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Leash
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Limits applied to every command built from this config.
    #[serde(default)]
    pub default_limits: ResourceLimits,

    /// Environment overrides applied to every command built from this config.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Named limit presets keyed by profile name.
    /// Values override `default_limits` field by field.
    #[serde(default)]
    pub profiles: HashMap<String, ResourceLimits>,
}

impl Config {
    /// Create a new config from the embedded example
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no limits, environment or profiles
    pub fn empty() -> Self {
        Self {
            default_limits: ResourceLimits::default(),
            env: HashMap::new(),
            profiles: HashMap::new(),
        }
    }

    /// Get a profile by name
    pub fn get_profile(&self, name: &str) -> Result<&ResourceLimits, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// Merge the default limits with an optional profile
    pub fn effective_limits(&self, profile: Option<&str>) -> Result<ResourceLimits, ConfigError> {
        match profile {
            Some(name) => Ok(self.default_limits.with_overrides(self.get_profile(name)?)),
            None => Ok(self.default_limits.clone()),
        }
    }

    /// Build a command for `program` seeded with this config's limits and environment
    pub fn command(
        &self,
        program: impl Into<String>,
        profile: Option<&str>,
    ) -> Result<Command, ConfigError> {
        let limits = self.effective_limits(profile)?;
        Command::new(program)
            .envs(self.env.clone())
            .limits(&limits)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}
