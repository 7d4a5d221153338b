//! Configuration management for autolabel.
//!
//! Configuration is loaded from the platform config directory with defaults
//! for every field, so an absent or partial file is always valid.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Corpus discovery settings
    pub processing: ProcessingConfig,

    /// Retry settings
    pub pipeline: PipelineConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Caption source settings
    pub caption: CaptionConfig,

    /// Tag extraction settings
    pub tagging: TaggingConfig,

    /// Detector settings
    pub detection: DetectionConfig,

    /// Frequency table settings
    pub aggregation: AggregationConfig,

    /// Per-image artifact settings
    pub annotation: AnnotationConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.autolabel.autolabel/config.toml
    /// - Linux: ~/.config/autolabel/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\autolabel\config\config.toml
    ///
    /// Falls back to ~/.autolabel/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "autolabel", "autolabel")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".autolabel").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved noun lexicon directory, if one is configured.
    pub fn lexicon_dir(&self) -> Option<PathBuf> {
        self.tagging
            .lexicon_dir
            .as_deref()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).into_owned()))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.detection.box_threshold, 0.25);
        assert_eq!(config.detection.text_threshold, 0.2);
        assert_eq!(config.tagging.separator, ", ");
        assert_eq!(config.detection.device, "cpu");
        assert!(config.detection.iou_threshold.is_none());
    }

    #[test]
    fn test_default_stop_list() {
        let config = Config::default();
        assert_eq!(config.aggregation.stop_list.len(), 17);
        assert!(config.aggregation.stop_list.iter().any(|t| t == "table"));
        assert!(config.aggregation.stop_list.iter().any(|t| t == "mouse"));
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[detection]"));
        assert!(toml.contains("[aggregation]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [detection]
            box_threshold = 0.35

            [aggregation]
            stop_list = ["hand"]
            "#,
        )
        .unwrap();
        assert_eq!(config.detection.box_threshold, 0.35);
        assert_eq!(config.detection.text_threshold, 0.2);
        assert_eq!(config.aggregation.stop_list, vec!["hand".to_string()]);
        assert_eq!(config.caption.provider, "sidecar");
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        let err = Config::from_toml("[detection]\nbox_threshold = 2.0\n").unwrap_err();
        assert!(err.to_string().contains("box_threshold"));
    }

    #[test]
    fn test_lexicon_dir_expands_tilde() {
        let mut config = Config::default();
        assert!(config.lexicon_dir().is_none());
        config.tagging.lexicon_dir = Some("/srv/lexicon".to_string());
        assert_eq!(config.lexicon_dir(), Some(PathBuf::from("/srv/lexicon")));
    }
}
