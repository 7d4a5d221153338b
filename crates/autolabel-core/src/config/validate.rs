//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

fn check_unit_interval(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be between 0.0 and 1.0"
        )));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_unit_interval("detection.box_threshold", self.detection.box_threshold)?;
        check_unit_interval("detection.text_threshold", self.detection.text_threshold)?;
        if let Some(iou) = self.detection.iou_threshold {
            check_unit_interval("detection.iou_threshold", iou)?;
        }
        if self.detection.max_text_len == 0 {
            return Err(ConfigError::ValidationError(
                "detection.max_text_len must be > 0".into(),
            ));
        }
        if self.detection.resize_short_side == 0 {
            return Err(ConfigError::ValidationError(
                "detection.resize_short_side must be > 0".into(),
            ));
        }
        if self.detection.resize_max_side < self.detection.resize_short_side {
            return Err(ConfigError::ValidationError(
                "detection.resize_max_side must be >= detection.resize_short_side".into(),
            ));
        }
        if !matches!(self.detection.device.as_str(), "cpu" | "cuda") {
            return Err(ConfigError::ValidationError(format!(
                "detection.device must be \"cpu\" or \"cuda\", got {:?}",
                self.detection.device
            )));
        }
        if self.tagging.separator.is_empty() {
            return Err(ConfigError::ValidationError(
                "tagging.separator must not be empty".into(),
            ));
        }
        if !matches!(self.caption.provider.as_str(), "sidecar" | "ollama") {
            return Err(ConfigError::ValidationError(format!(
                "caption.provider must be \"sidecar\" or \"ollama\", got {:?}",
                self.caption.provider
            )));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0
            || self.limits.caption_timeout_ms == 0
            || self.limits.detect_timeout_ms == 0
        {
            return Err(ConfigError::ValidationError(
                "limits.*_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_thresholds_out_of_range() {
        let mut config = Config::default();
        config.detection.text_threshold = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("text_threshold"));

        let mut config = Config::default();
        config.detection.iou_threshold = Some(1.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("iou_threshold"));
    }

    #[test]
    fn test_validate_rejects_unknown_device() {
        let mut config = Config::default();
        config.detection.device = "tpu".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("detection.device"));
    }

    #[test]
    fn test_validate_rejects_empty_separator() {
        let mut config = Config::default();
        config.tagging.separator = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("separator"));
    }

    #[test]
    fn test_validate_rejects_inverted_resize_bounds() {
        let mut config = Config::default();
        config.detection.resize_max_side = 400;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("resize_max_side"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.detect_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_unknown_caption_provider() {
        let mut config = Config::default();
        config.caption.provider = "blip".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("caption.provider"));
    }
}
