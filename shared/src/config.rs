//! Configuration management (`config.toml`)
//!
//! Handles loading, saving, and providing defaults for the settings the audio
//! core reads at initialisation. Settings are stored in TOML format in the
//! platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration shared between the controlling process and the audio core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SharedConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Audio output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Output sample bit depth, 8 (unsigned) or 16 (signed) (default: 16)
    #[serde(default = "default_bitdepth")]
    pub bitdepth: u16,
    /// Output channel count (default: 2)
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Output sample frequency in Hz (default: 44100)
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    /// Skip handing mixed audio to the playback device (default: false)
    #[serde(default)]
    pub mute: bool,
}

fn default_bitdepth() -> u16 {
    16
}
fn default_channels() -> u16 {
    2
}
fn default_frequency() -> u32 {
    44_100
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bitdepth: default_bitdepth(),
            channels: default_channels(),
            frequency: default_frequency(),
            mute: false,
        }
    }
}

/// Errors from reading or writing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/tickmix`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "tickmix", "tickmix")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> SharedConfig {
    let Some(path) = config_dir().map(|dir| dir.join("config.toml")) else {
        return SharedConfig::default();
    };
    if !path.exists() {
        return SharedConfig::default();
    }
    load_from(&path).unwrap_or_else(|e| {
        warn!("{}; using default configuration", e);
        SharedConfig::default()
    })
}

/// Loads the configuration from an explicit path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_from(path: &Path) -> Result<SharedConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Saves the configuration to an explicit path, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save_to(path: &Path, config: &SharedConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_err)?;
    Ok(())
}

/// Saves the configuration to the platform config directory.
///
/// Does nothing if the home directory cannot be determined.
pub fn save(config: &SharedConfig) -> Result<(), ConfigError> {
    match config_dir() {
        Some(dir) => save_to(&dir.join("config.toml"), config),
        None => Ok(()),
    }
}
