//! # Configuration Persistence
//!
//! Sync settings saved to and loaded from disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::RetryPolicy;
use crate::Result;

/// Attempts after which a queued entry is abandoned.
pub const DEFAULT_RETRY_CEILING: u32 = 5;

/// Settings for the offline queue and sync sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Where the device id and the durable queue live.
    pub data_dir: PathBuf,

    /// Prefix of the queue file name, so several apps can share a data
    /// directory.
    pub namespace: String,

    /// Failed drain attempts before a queued entry is dropped.
    pub retry_ceiling: u32,

    /// Backoff for reconnecting the realtime channel.
    pub retry: RetryPolicy,

    /// Refetch the whole match after a drain empties the queue.
    pub refetch_after_drain: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .map(|p| p.join("courtside"))
                .unwrap_or_else(|| PathBuf::from(".courtside")),
            namespace: "courtside".to_string(),
            retry_ceiling: DEFAULT_RETRY_CEILING,
            retry: RetryPolicy::default(),
            refetch_after_drain: true,
        }
    }
}

impl SyncConfig {
    /// Returns the config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("courtside").join("config.json"))
    }

    /// Loads configuration from disk, or returns default if not found.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(?path, "Loaded configuration");
                    config
                }
                Err(e) => {
                    tracing::warn!(?path, error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(?path, error = %e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine config directory",
            )
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Saves configuration to `path`, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        tracing::info!(?path, "Saved configuration");
        Ok(())
    }

    /// Overrides the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}
