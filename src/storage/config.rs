//! Application configuration loaded from TOML.

use crate::recording::live::DEFAULT_STALENESS_MS;
use crate::sensors::types::{SensorConfig, SensorSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sensor settings
    pub sensors: SensorSettings,
    /// Recording settings
    pub recording: RecordingSettings,
}

/// Sensor-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Where samples come from
    pub source: SensorSource,
    /// Discovery timeout in seconds
    pub discovery_timeout_secs: u64,
    /// Fixed seed for mock sensors; derived from the clock when unset
    pub mock_seed: Option<u64>,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            source: SensorSource::Bluetooth,
            discovery_timeout_secs: 30,
            mock_seed: None,
        }
    }
}

impl SensorSettings {
    /// Runtime sensor configuration for these settings.
    pub fn to_sensor_config(&self) -> SensorConfig {
        let mock_seed = self
            .mock_seed
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);

        SensorConfig {
            source: self.source,
            discovery_timeout_secs: self.discovery_timeout_secs,
            mock_seed,
        }
    }
}

/// Recording-related settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    /// Export directory; the data directory when unset
    pub export_dir: Option<PathBuf>,
    /// Age after which a live value is shown as missing
    pub staleness_ms: i64,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            export_dir: None,
            staleness_ms: DEFAULT_STALENESS_MS,
        }
    }
}

impl RecordingSettings {
    /// Directory exports are written to.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(get_data_dir)
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "ridesync", "RideSync")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load configuration from `path`, falling back to defaults when absent.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(toml::from_str(&content)?)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save configuration to `path`, creating parent directories.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_error)?;

    tracing::info!("Saved config to {}", path.display());
    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
