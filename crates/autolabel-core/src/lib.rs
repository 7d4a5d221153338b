//! Autolabel Core - caption-driven open-vocabulary image auto-labeling.
//!
//! Every image of a corpus is captioned, the caption's nouns become a
//! detector prompt, and the detector's boxes are decoded back into phrases
//! whose words are counted across the corpus:
//!
//! ```text
//! Image → Caption → Noun tags → Prompt → Detect → Decode → Frequency table
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use autolabel_core::{AutoLabeler, CaptionSourceFactory, Config, GroundingDino};
//!
//! #[tokio::main]
//! async fn main() -> autolabel_core::Result<()> {
//!     let config = Config::load()?;
//!     let timeout = std::time::Duration::from_secs(60);
//!     let captioner = CaptionSourceFactory::create(&config.caption, timeout)?;
//!     let detector = Arc::new(GroundingDino::load(&config.detection, &config.model_dir())?);
//!     let labeler = AutoLabeler::new(&config, captioner, detector)?;
//!
//!     let report = labeler.run("./frames".as_ref()).await?;
//!     println!("{}", serde_json::to_string_pretty(&report.tag_frequencies)?);
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod annotation;
pub mod caption;
pub mod config;
pub mod detection;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod tagging;
pub mod types;

pub use aggregate::{FrequencyAggregator, StopList, TagFrequencyTable};
pub use annotation::AnnotationWriter;
pub use caption::{CaptionSource, CaptionSourceFactory};
pub use config::Config;
pub use detection::{DetectionDecoder, DetectionSource, GroundingDino, RawDetections};
pub use error::{AutolabelError, ConfigError, PipelineError, PipelineResult, Result};
pub use output::{OutputFormat, RecordWriter};
pub use pipeline::{AutoLabeler, DiscoveredFile, LoadedImage};
pub use tagging::{Prompt, TagExtractor};
pub use types::{Detection, ImageFailure, ImageLabels, ProcessingStats, RunReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
