//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where detector models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.autolabel/models"),
        }
    }
}

/// Corpus discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// File extensions picked up from the input directory
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
                "tiff".to_string(),
            ],
        }
    }
}

/// Orchestration settings for retries around network-backed collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max retry attempts for transient caption failures
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds (doubles per attempt)
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Caption call timeout in milliseconds
    pub caption_timeout_ms: u64,

    /// Detector inference timeout in milliseconds
    pub detect_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            caption_timeout_ms: 120_000,
            detect_timeout_ms: 120_000,
        }
    }
}

/// Caption source selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Caption source: "sidecar" or "ollama"
    pub provider: String,

    /// Caption file for the sidecar source (JSON object or `name<TAB>caption` lines)
    pub sidecar_path: Option<PathBuf>,

    /// Ollama settings, used when `provider = "ollama"`
    pub ollama: OllamaConfig,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            provider: "sidecar".to_string(),
            sidecar_path: None,
            ollama: OllamaConfig::default(),
        }
    }
}

/// Ollama vision model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Vision model name
    pub model: String,

    /// Instruction sent alongside the image
    pub prompt: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            prompt: "Write one short sentence describing this image. \
                     Name the visible objects plainly."
                .to_string(),
        }
    }
}

/// Tag extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Separator used to join extracted tags into the detector prompt
    pub separator: String,

    /// Directory holding `wordnet_nouns.txt` (optional noun lexicon)
    pub lexicon_dir: Option<String>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            separator: ", ".to_string(),
            lexicon_dir: None,
        }
    }
}

/// Open-vocabulary detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Minimum query confidence (exclusive) for a box to survive
    pub box_threshold: f32,

    /// Minimum token activation (exclusive) for a token to join a phrase
    pub text_threshold: f32,

    /// Optional class-agnostic NMS IoU threshold; `None` keeps every query
    pub iou_threshold: Option<f32>,

    /// Maximum prompt length in tokens
    pub max_text_len: usize,

    /// Target length of the image's short side
    pub resize_short_side: u32,

    /// Upper bound on the image's long side after resizing
    pub resize_max_side: u32,

    /// Execution device: "cpu" or "cuda"
    pub device: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model: "groundingdino-swint-ogc".to_string(),
            box_threshold: 0.25,
            text_threshold: 0.2,
            iou_threshold: None,
            max_text_len: 256,
            resize_short_side: 800,
            resize_max_side: 1333,
            device: "cpu".to_string(),
        }
    }
}

/// Frequency aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Tags that never enter the frequency table
    pub stop_list: Vec<String>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            stop_list: crate::aggregate::DEFAULT_STOP_LIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Per-image annotation artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Whether to write `label.json` and `mask.png` per image
    pub enabled: bool,

    /// Root directory for per-image artifact folders
    pub output_dir: PathBuf,

    /// Also write `overlay.jpg` with boxes drawn on the image
    pub overlay: bool,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: PathBuf::from("outputs"),
            overlay: true,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
