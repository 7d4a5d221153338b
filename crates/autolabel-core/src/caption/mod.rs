//! Caption sources.
//!
//! A caption source produces one natural-language description per image.
//! Two sources ship with the crate:
//! - **sidecar**: captions precomputed into a JSON or TSV file
//! - **ollama**: a local vision model served by Ollama

pub mod ollama;
pub mod retry;
pub mod sidecar;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::CaptionConfig;
use crate::error::PipelineError;
use crate::pipeline::LoadedImage;

pub use ollama::OllamaCaptioner;
pub use retry::RetryPolicy;
pub use sidecar::SidecarCaptions;

/// Trait that all caption sources implement.
///
/// Uses `async_trait` so sources can be boxed (`Box<dyn CaptionSource>`).
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Describe one image.
    async fn caption(&self, image: &LoadedImage) -> Result<String, PipelineError>;
}

/// Creates the configured caption source.
pub struct CaptionSourceFactory;

impl CaptionSourceFactory {
    /// Build the source named by `config.provider`.
    ///
    /// `timeout` bounds each network request of remote sources.
    pub fn create(
        config: &CaptionConfig,
        timeout: Duration,
    ) -> Result<Box<dyn CaptionSource>, PipelineError> {
        match config.provider.as_str() {
            "sidecar" => {
                let path = config
                    .sidecar_path
                    .as_ref()
                    .ok_or_else(|| PipelineError::Caption {
                        path: PathBuf::new(),
                        message: "Sidecar caption source needs caption.sidecar_path (--captions)"
                            .to_string(),
                        status_code: None,
                    })?;
                Ok(Box::new(SidecarCaptions::load(path)?))
            }
            "ollama" => Ok(Box::new(OllamaCaptioner::new(&config.ollama, timeout))),
            other => Err(PipelineError::Caption {
                path: PathBuf::new(),
                message: format!("Unknown caption provider: {other}"),
                status_code: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_sidecar_requires_path() {
        let config = CaptionConfig::default();
        let result = CaptionSourceFactory::create(&config, Duration::from_secs(1));
        assert!(matches!(result, Err(PipelineError::Caption { .. })));
    }

    #[test]
    fn test_factory_ollama() {
        let config = CaptionConfig {
            provider: "ollama".to_string(),
            ..CaptionConfig::default()
        };
        let source = CaptionSourceFactory::create(&config, Duration::from_secs(1)).unwrap();
        assert_eq!(source.name(), "ollama");
    }

    #[test]
    fn test_factory_sidecar_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.json");
        std::fs::write(&path, r#"{"img1.png": "a cat"}"#).unwrap();
        let config = CaptionConfig {
            sidecar_path: Some(path),
            ..CaptionConfig::default()
        };
        let source = CaptionSourceFactory::create(&config, Duration::from_secs(1)).unwrap();
        assert_eq!(source.name(), "sidecar");
    }

    #[test]
    fn test_factory_unknown() {
        let config = CaptionConfig {
            provider: "blip".to_string(),
            ..CaptionConfig::default()
        };
        assert!(CaptionSourceFactory::create(&config, Duration::from_secs(1)).is_err());
    }
}
