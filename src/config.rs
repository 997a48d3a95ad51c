//! Engine configuration.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentTables;

/// Default configuration shipped with the crate.
pub const BUILTIN_ENGINE_CONFIG: &str = include_str!("data/engine_config.json");

/// Tunables for turn resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the server-side RNG (damage rolls, spawn and exit placement).
    pub seed: u64,
    /// Lowest damage roll, as a percentage of a weapon's maximum.
    pub damage_floor_percent: u32,
    /// Content tables to load instead of the builtin ones.
    pub content_path: Option<PathBuf>,
    /// Emit income actions for resources whose per-turn total is zero.
    pub emit_zero_income: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            damage_floor_percent: 80,
            content_path: None,
            emit_zero_income: true,
        }
    }
}

impl EngineConfig {
    /// The configuration bundled with the crate.
    ///
    /// # Panics
    ///
    /// Panics if the bundled JSON is invalid, which is a build defect.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_ENGINE_CONFIG).expect("builtin engine config should parse")
    }

    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = read_file(path)?;
        Self::from_json_str(&contents)
    }

    /// Load the content tables this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the override file cannot be read or parsed.
    pub fn load_content(&self) -> Result<Arc<ContentTables>, ConfigError> {
        match &self.content_path {
            Some(path) => Ok(Arc::new(ContentTables::from_file(path)?)),
            None => Ok(ContentTables::builtin()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.damage_floor_percent > 100 {
            return Err(ConfigError::InvalidValue(format!(
                "damage_floor_percent must be at most 100, got {}",
                self.damage_floor_percent
            )));
        }
        Ok(())
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Failure to load configuration or content tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON did not match the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The file could not be read.
    #[error("failed to read config from {path:?}: {source}")]
    ReadFailed {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A value parsed but is out of range.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}
