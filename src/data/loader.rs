//! Config loader
//!
//! Loads the spawner config from RON or JSON files, with fallback to defaults.

use std::fs;
use std::path::Path;

use super::config::SpawnerConfig;
use crate::error::ConfigError;

/// Config file formats, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Ron,
    Json,
}

impl ConfigFormat {
    /// Guess the format from a path; anything but `.json` is RON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Ron,
        }
    }
}

/// Parse a config from text
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<SpawnerConfig, ConfigError> {
    let config: SpawnerConfig = match format {
        ConfigFormat::Ron => {
            ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load and validate a config file
pub fn load_config(path: &Path) -> Result<SpawnerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content, ConfigFormat::from_path(path))?;
    log::info!("Loaded spawner config from {}", path.display());
    Ok(config)
}

impl SpawnerConfig {
    /// Load from `path`, falling back to defaults if missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        load_config(path).unwrap_or_else(|e| {
            log::warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
            Self::default()
        })
    }
}

/// Serialize a config in the given format
pub fn config_to_string(
    config: &SpawnerConfig,
    format: ConfigFormat,
) -> Result<String, ConfigError> {
    match format {
        ConfigFormat::Ron => ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string())),
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }
}

/// Export the default config for easy editing
pub fn export_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let text = config_to_string(&SpawnerConfig::default(), ConfigFormat::from_path(path))?;
    fs::write(path, text)?;
    Ok(())
}
