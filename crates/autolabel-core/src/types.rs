//! Core data types produced by the labeling pipeline.

use serde::{Deserialize, Serialize};

use crate::aggregate::TagFrequencyTable;
use crate::detection::BoundingBox;

/// One detector query that survived the box threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Normalized center-format box
    #[serde(rename = "box")]
    pub bbox: BoundingBox,

    /// Maximum token activation of the query
    pub score: f32,

    /// Prompt words the query is attributed to (may be empty)
    pub phrase: String,

    /// Display label: `phrase(0.xx)`
    pub label: String,

    /// Whitespace-split phrase, fed to the frequency table
    pub tokens: Vec<String>,
}

/// Everything produced for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLabels {
    /// File name within the corpus directory
    pub file_name: String,

    /// Numeric key used to order the corpus
    pub ordering_key: u64,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Caption from the caption source
    pub caption: String,

    /// Extracted noun tags, separator-joined
    pub tags: String,

    /// Prompt sent to the detector
    pub prompt: String,

    /// Surviving detections in emission order
    pub detections: Vec<Detection>,
}

impl ImageLabels {
    /// All per-query token lists flattened, in emission order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.detections
            .iter()
            .flat_map(|d| d.tokens.iter().map(String::as_str))
    }
}

/// An image that could not be labeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFailure {
    /// File name within the corpus directory
    pub file_name: String,

    /// Rendered error
    pub error: String,
}

/// Processing statistics for a run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessingStats {
    /// Images labeled successfully
    pub succeeded: usize,

    /// Images that failed
    pub failed: usize,

    /// Total detections emitted across the corpus
    pub detections: usize,

    /// Processing rate in images per second
    pub images_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

/// Final result of labeling a corpus.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunReport {
    /// Corpus-wide tag counts
    pub tag_frequencies: TagFrequencyTable,

    /// Run statistics
    pub stats: ProcessingStats,

    /// Images that were skipped because a collaborator failed
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failures: Vec<ImageFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(phrase: &str) -> Detection {
        Detection {
            bbox: BoundingBox::new(0.5, 0.5, 0.2, 0.2),
            score: 0.4,
            phrase: phrase.to_string(),
            label: format!("{phrase}(0.40)"),
            tokens: phrase.split_whitespace().map(String::from).collect(),
        }
    }

    #[test]
    fn test_image_labels_flattens_tokens() {
        let labels = ImageLabels {
            file_name: "img1.png".to_string(),
            ordering_key: 1,
            width: 10,
            height: 10,
            caption: "a cat and a coffee cup".to_string(),
            tags: "cat, coffee, cup".to_string(),
            prompt: "cat, coffee, cup.".to_string(),
            detections: vec![detection("cat"), detection("coffee cup"), detection("")],
        };
        let tokens: Vec<&str> = labels.tokens().collect();
        assert_eq!(tokens, vec!["cat", "coffee", "cup"]);
    }

    #[test]
    fn test_detection_serializes_box_field() {
        let json = serde_json::to_string(&detection("cat")).unwrap();
        assert!(json.contains("\"box\":"));
        assert!(json.contains("\"label\":\"cat(0.40)\""));
    }

    #[test]
    fn test_run_report_skips_empty_failures() {
        let report = RunReport::default();
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("failures"));
    }
}
