//! Open-vocabulary detection and decoding of its output.
//!
//! A [`DetectionSource`] runs a grounded detector on one image conditioned on
//! a text prompt and returns [`RawDetections`]: per-query token activations,
//! per-query normalized boxes and the prompt's tokenization. The
//! [`DetectionDecoder`] turns that into labeled [`Detection`](crate::types::Detection)s.
//!
//! # Usage
//!
//! ```rust,ignore
//! use autolabel_core::detection::{DetectionDecoder, GroundingDino};
//!
//! let detector = GroundingDino::load(&config.detection, &config.model_dir())?;
//! let raw = detector.detect(&image, &prompt, &path)?;
//! let decoded = DetectionDecoder::new(0.25, 0.2).decode(&raw);
//! ```

pub mod boxes;
pub mod decoder;
pub(crate) mod grounding_dino;
pub mod preprocess;
pub(crate) mod text_mask;
pub mod tokenization;

use std::path::Path;

use image::DynamicImage;

use crate::error::PipelineError;
use crate::tagging::Prompt;

pub use boxes::{non_maximum_suppression, BoundingBox};
pub use decoder::{render_confidence, DecodedDetections, DetectionDecoder, RawDetections};
pub use grounding_dino::GroundingDino;
pub use tokenization::{PromptToken, PromptTokenization};

/// A grounded detector: image plus prompt in, raw query activations out.
///
/// Implementations are synchronous and CPU/GPU-bound; the pipeline calls them
/// from the blocking thread pool.
pub trait DetectionSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run the detector on one image.
    ///
    /// `path` identifies the image in errors.
    fn detect(
        &self,
        image: &DynamicImage,
        prompt: &Prompt,
        path: &Path,
    ) -> Result<RawDetections, PipelineError>;
}
