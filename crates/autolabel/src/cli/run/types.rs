//! CLI enum types for the run command.

use clap::ValueEnum;

/// Layout of the per-image records file.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RecordFormat {
    /// One JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<RecordFormat> for autolabel_core::OutputFormat {
    fn from(format: RecordFormat) -> Self {
        match format {
            RecordFormat::Json => Self::Json,
            RecordFormat::Jsonl => Self::JsonLines,
        }
    }
}

/// Where captions come from.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Captioner {
    /// Precomputed captions file (`--captions`)
    Sidecar,
    /// Local Ollama vision model
    Ollama,
}

impl std::fmt::Display for Captioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Captioner::Sidecar => write!(f, "sidecar"),
            Captioner::Ollama => write!(f, "ollama"),
        }
    }
}

/// Detector execution device.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Device {
    Cpu,
    Cuda,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}
