//! Store configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment override for [`StoreConfig::database_path`].
pub const DATABASE_PATH_ENV: &str = "CLINIC_DATABASE_PATH";
/// Environment override for [`StoreConfig::busy_timeout_ms`].
pub const BUSY_TIMEOUT_ENV: &str = "CLINIC_BUSY_TIMEOUT_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {0}: {1}")]
    InvalidEnv(&'static str, String),
}

/// Local store settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// How long a write waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("clinic.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// Parse configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse JSON, then apply env overrides on top.
    pub fn from_json_with_env(json: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_json(json)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load with priority: env vars > config file > defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
                Self::from_json(&contents)?
            }
            _ => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
            self.database_path = PathBuf::from(path);
        }
        if let Ok(raw) = std::env::var(BUSY_TIMEOUT_ENV) {
            self.busy_timeout_ms = raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnv(BUSY_TIMEOUT_ENV, raw))?;
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
