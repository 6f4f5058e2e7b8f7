//! Configuration management for camsession
//!
//! Provides loading, saving and validation of the session settings that are
//! fixed at construction time: boot-config caching and recording thresholds.

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CamSessionConfig {
    pub session: SessionSettings,
    pub video: VideoSettings,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Persist the boot configuration after each successful configure
    pub cache_config: bool,
    /// Storage key the boot configuration lives under
    pub boot_config_key: String,
}

/// Video recording configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Minimum free bytes required to start a recording
    pub record_space_min: u64,
    /// Bytes kept free below the raw free space when no cap is set
    pub record_space_padding: u64,
    /// Explicit recording size cap, 0 for none
    pub max_file_size_bytes: u64,
    /// Directory new recordings are written to
    pub directory: String,
    pub file_prefix: String,
    pub extension: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cache_config: false,
            boot_config_key: "cameraBootConfig".to_string(),
        }
    }
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            record_space_min: 1024 * 1024,
            record_space_padding: 1024 * 1024,
            max_file_size_bytes: 0,
            directory: "DCIM/100CAMRA".to_string(),
            file_prefix: "VID_".to_string(),
            extension: "3gp".to_string(),
        }
    }
}

impl CamSessionConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: CamSessionConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("camsession.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if self.session.boot_config_key.trim().is_empty() {
            return Err(CameraError::ConfigError(
                "Boot config key must not be empty".to_string(),
            ));
        }
        if self.video.extension.is_empty() || self.video.extension.contains('.') {
            return Err(CameraError::ConfigError(
                "Video extension must be a bare extension like \"3gp\"".to_string(),
            ));
        }
        if self.video.max_file_size_bytes != 0
            && self.video.max_file_size_bytes < self.video.record_space_padding
        {
            log::warn!(
                "max_file_size_bytes ({}) is below record_space_padding ({})",
                self.video.max_file_size_bytes,
                self.video.record_space_padding
            );
        }
        Ok(())
    }
}
