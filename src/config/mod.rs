//! Configuration types and file loading.
//!
//! Configurations can be read from TOML or JSON; the format is picked from the
//! file extension.

mod pipeline;
mod registry;

pub use pipeline::{BlendConfig, PipelineConfig};
pub use registry::{ModelSource, RegistryConfig};

use headswap_core::core::{SwapError, SwapResult};
use std::path::Path;

/// Configuration file format
#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Loads and saves [`RegistryConfig`] files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, auto-detecting the format from the extension
    ///
    /// Files without a recognised extension are parsed as JSON.
    pub fn load_from_file(path: &Path) -> SwapResult<RegistryConfig> {
        let format = ConfigFormat::from_extension(path).unwrap_or(ConfigFormat::Json);
        let content = std::fs::read_to_string(path).map_err(|e| {
            SwapError::config_error(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::load_from_string(&content, format)
    }

    /// Load configuration from a string with specified format
    pub fn load_from_string(content: &str, format: ConfigFormat) -> SwapResult<RegistryConfig> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
                SwapError::config_error(format!("failed to parse TOML config: {e}"))
            }),
            ConfigFormat::Json => Ok(serde_json::from_str(content)?),
        }
    }

    /// Save configuration to a file, auto-detecting the format from the extension
    pub fn save_to_file(config: &RegistryConfig, path: &Path) -> SwapResult<()> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            SwapError::config_error(format!(
                "unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;
        let content = Self::save_to_string(config, format)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save configuration to string with specified format
    pub fn save_to_string(config: &RegistryConfig, format: ConfigFormat) -> SwapResult<String> {
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| {
                SwapError::config_error(format!("failed to serialize config to TOML: {e}"))
            }),
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        }
    }
}
