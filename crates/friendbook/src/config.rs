//! Configuration management for friendbook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::location::{Coordinate, DEFAULT_CHANNEL_CAPACITY};
use crate::store::WritePolicy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "friendbook";

/// Default record file name.
const RECORDS_FILE_NAME: &str = "SavedFriends.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FRIENDBOOK_`)
/// 2. TOML config file at `~/.config/friendbook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Location configuration.
    pub location: LocationConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the record file.
    /// Defaults to `~/.local/share/friendbook/SavedFriends.json`
    pub path: Option<PathBuf>,
    /// Behaviour when a write fails.
    pub write_policy: WritePolicy,
}

/// Location-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Position reported on machines without a location receiver.
    /// Unset means location access is treated as denied.
    pub fixed: Option<Coordinate>,
    /// How long the add command lets the feed run before saving, in milliseconds.
    pub settle_ms: u64,
    /// Capacity of the channel between provider and feed.
    pub channel_capacity: usize,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fixed: None,
            settle_ms: 250,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FRIENDBOOK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.location.channel_capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "channel_capacity must be greater than 0".to_string(),
            });
        }

        if let Some(fixed) = self.location.fixed {
            if !fixed.is_valid() {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "fixed location ({}, {}) is outside [-90,90] x [-180,180]",
                        fixed.latitude, fixed.longitude
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the record file path, resolving defaults if not set.
    #[must_use]
    pub fn records_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(RECORDS_FILE_NAME))
    }

    /// Get the settle time as a Duration.
    #[must_use]
    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.location.settle_ms)
    }
}
