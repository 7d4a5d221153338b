//! Error types for the auto-labeling pipeline.
//!
//! [`PipelineError`] variants name the stage that failed and, where there is
//! one, the image it failed on. A per-image error aborts that image only;
//! discovery and model loading errors abort the run.

use std::path::PathBuf;

use thiserror::Error;

/// Any error surfaced by the library.
#[derive(Debug, Error)]
pub enum AutolabelError {
    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Problems loading or validating `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Malformed TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is out of range or names an unknown option
    #[error("{0}")]
    ValidationError(String),
}

/// Failures while labeling, by stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bytes could not be read or decoded into pixels
    #[error("Cannot decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("{path}: unsupported image format {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("{path} is {size_mb}MB, over the {max_mb}MB limit")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    #[error("{path} is {width}x{height}, over the {max_dim}px limit")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    #[error("No such file or directory: {0}")]
    FileNotFound(PathBuf),

    /// Corpus root is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A corpus file name carries no number to order it by
    #[error("Cannot order {name}: {reason}")]
    UnorderableFilename { name: String, reason: String },

    /// Caption source failed
    #[error("Caption failed for {path}: {message}")]
    Caption {
        path: PathBuf,
        message: String,
        /// HTTP status for network-backed sources, used for retry classification
        status_code: Option<u16>,
    },

    /// Detection source failed or returned malformed output
    #[error("Detection failed for {path}: {message}")]
    Detection { path: PathBuf, message: String },

    /// Detector files missing or unloadable
    #[error("Detector model: {message}")]
    Model { message: String },

    #[error("Cannot write annotations to {path}: {message}")]
    Annotation { path: PathBuf, message: String },

    #[error("{stage} timed out for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },
}

pub type Result<T> = std::result::Result<T, AutolabelError>;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_image() {
        let err = PipelineError::Timeout {
            path: PathBuf::from("frames/img7.png"),
            stage: "detect".to_string(),
            timeout_ms: 500,
        };
        assert_eq!(err.to_string(), "detect timed out for frames/img7.png after 500ms");

        let err = PipelineError::UnorderableFilename {
            name: "cover.png".to_string(),
            reason: "no digits in file name".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot order cover.png: no digits in file name");
    }

    #[test]
    fn test_pipeline_error_converts() {
        let err: AutolabelError = PipelineError::NotADirectory(PathBuf::from("x")).into();
        assert_eq!(err.to_string(), "Not a directory: x");
    }
}
