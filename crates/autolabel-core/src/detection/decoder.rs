//! Turns raw detector output into labeled detections.
//!
//! Per query: confidence is the maximum activation over token positions;
//! queries at or below the box threshold are dropped; the surviving query's
//! tokens above the text threshold are decoded into a phrase.

use std::path::Path;

use ndarray::Array2;

use crate::error::PipelineError;
use crate::types::Detection;

use super::boxes::BoundingBox;
use super::tokenization::PromptTokenization;

/// Detector output for one image, validated for shape.
#[derive(Debug, Clone)]
pub struct RawDetections {
    confidences: Array2<f32>,
    boxes: Array2<f32>,
    tokenization: PromptTokenization,
}

impl RawDetections {
    /// Bundle a `[num_queries, vocab_len]` confidence matrix with its
    /// `[num_queries, 4]` normalized `cxcywh` boxes.
    pub fn new(
        confidences: Array2<f32>,
        boxes: Array2<f32>,
        tokenization: PromptTokenization,
        path: &Path,
    ) -> Result<Self, PipelineError> {
        if confidences.nrows() != boxes.nrows() {
            return Err(PipelineError::Detection {
                path: path.to_path_buf(),
                message: format!(
                    "Query count mismatch: {} confidence rows vs {} boxes",
                    confidences.nrows(),
                    boxes.nrows()
                ),
            });
        }
        if boxes.ncols() != 4 {
            return Err(PipelineError::Detection {
                path: path.to_path_buf(),
                message: format!("Boxes must have 4 columns, got {}", boxes.ncols()),
            });
        }
        Ok(Self {
            confidences,
            boxes,
            tokenization,
        })
    }

    /// No queries at all.
    pub fn empty(tokenization: PromptTokenization) -> Self {
        Self {
            confidences: Array2::zeros((0, 0)),
            boxes: Array2::zeros((0, 4)),
            tokenization,
        }
    }

    pub fn num_queries(&self) -> usize {
        self.confidences.nrows()
    }

    pub fn confidences(&self) -> &Array2<f32> {
        &self.confidences
    }

    pub fn boxes(&self) -> &Array2<f32> {
        &self.boxes
    }

    pub fn tokenization(&self) -> &PromptTokenization {
        &self.tokenization
    }
}

/// Detections that survived decoding, in query order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedDetections {
    detections: Vec<Detection>,
}

impl DecodedDetections {
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.detections.iter().map(|d| d.bbox).collect()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.detections.iter().map(|d| d.score).collect()
    }

    /// Rendered `phrase(score)` labels.
    pub fn labels(&self) -> Vec<&str> {
        self.detections.iter().map(|d| d.label.as_str()).collect()
    }

    pub fn token_lists(&self) -> Vec<&[String]> {
        self.detections.iter().map(|d| d.tokens.as_slice()).collect()
    }

    pub fn as_slice(&self) -> &[Detection] {
        &self.detections
    }

    pub fn into_vec(self) -> Vec<Detection> {
        self.detections
    }
}

/// Threshold-and-decode stage between the detector and the aggregator.
#[derive(Debug, Clone, Copy)]
pub struct DetectionDecoder {
    box_threshold: f32,
    text_threshold: f32,
}

impl DetectionDecoder {
    pub fn new(box_threshold: f32, text_threshold: f32) -> Self {
        Self {
            box_threshold,
            text_threshold,
        }
    }

    pub fn box_threshold(&self) -> f32 {
        self.box_threshold
    }

    pub fn text_threshold(&self) -> f32 {
        self.text_threshold
    }

    /// Filter queries by confidence and decode each survivor's phrase.
    ///
    /// Every query whose confidence is strictly above the box threshold yields
    /// exactly one entry, even when its phrase decodes to nothing.
    pub fn decode(&self, raw: &RawDetections) -> DecodedDetections {
        let mut detections = Vec::new();

        for (row, bbox) in raw.confidences.outer_iter().zip(raw.boxes.outer_iter()) {
            let score = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            if !(score > self.box_threshold) {
                continue;
            }

            let mask: Vec<bool> = row.iter().map(|&v| v > self.text_threshold).collect();
            let phrase = raw.tokenization.decode(&mask);
            let tokens = phrase.split_whitespace().map(String::from).collect();
            let label = format!("{phrase}({})", render_confidence(score));

            detections.push(Detection {
                bbox: BoundingBox::new(bbox[0], bbox[1], bbox[2], bbox[3]),
                score,
                phrase,
                label,
                tokens,
            });
        }

        DecodedDetections { detections }
    }
}

impl Default for DetectionDecoder {
    fn default() -> Self {
        Self::new(0.25, 0.2)
    }
}

/// Four-character display form of a confidence score.
///
/// Textual truncation of the score widened to `f64`, never rounding: `0.9`
/// is stored as `0.8999999761581421` and renders `0.89`. Short
/// representations are padded (`1.0` renders `1.00`, `0.5` renders `0.50`).
pub fn render_confidence(score: f32) -> String {
    let mut text = f64::from(score).to_string();
    if score.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    while text.chars().count() < 4 {
        text.push('0');
    }
    text.chars().take(4).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tokenization() -> PromptTokenization {
        // [CLS] cat , coffee cup . [SEP]
        PromptTokenization::basic("cat, coffee cup.")
    }

    fn raw(confidences: Array2<f32>) -> RawDetections {
        let n = confidences.nrows();
        let boxes = Array2::from_shape_fn((n, 4), |(q, c)| 0.1 * (q + c) as f32);
        RawDetections::new(confidences, boxes, tokenization(), Path::new("img1.png")).unwrap()
    }

    #[test]
    fn test_render_confidence_truncates() {
        assert_eq!(render_confidence(0.256789), "0.25");
        assert_eq!(render_confidence(0.999), "0.99");
        assert_eq!(render_confidence(0.25999), "0.25");
    }

    #[test]
    fn test_render_confidence_uses_stored_value() {
        assert_eq!(render_confidence(0.9), "0.89");
        assert_eq!(render_confidence(0.7), "0.69");
        assert_eq!(render_confidence(0.58), "0.57");
        assert_eq!(render_confidence(0.29), "0.28");
        assert_eq!(render_confidence(0.3), "0.30");
    }

    #[test]
    fn test_render_confidence_pads_short_values() {
        assert_eq!(render_confidence(1.0), "1.00");
        assert_eq!(render_confidence(0.5), "0.50");
        assert_eq!(render_confidence(0.0), "0.00");
    }

    #[test]
    fn test_threshold_keeps_exactly_queries_above() {
        let confidences = array![
            [0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.25, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.3, 0.3, 0.0, 0.0],
            [0.0, 0.1, 0.1, 0.1, 0.1, 0.1, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.26, 0.0, 0.0],
        ];
        let decoded = DetectionDecoder::new(0.25, 0.2).decode(&raw(confidences));
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.scores(), vec![0.9, 0.3, 0.26]);
        assert_eq!(
            decoded.labels(),
            vec!["cat(0.89)", "coffee cup(0.30)", "cup(0.25)"]
        );
    }

    #[test]
    fn test_labels_and_token_lists() {
        let confidences = array![
            [0.0, 0.0, 0.0, 0.45, 0.45, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let decoded = DetectionDecoder::default().decode(&raw(confidences));
        assert_eq!(decoded.labels(), vec!["coffee cup(0.44)"]);
        assert_eq!(
            decoded.token_lists(),
            vec![&["coffee".to_string(), "cup".to_string()][..]]
        );
    }

    #[test]
    fn test_empty_phrase_passes_through() {
        // Only punctuation activates above the text threshold
        let confidences = array![[0.0, 0.1, 0.8, 0.1, 0.1, 0.0, 0.0]];
        let decoded = DetectionDecoder::default().decode(&raw(confidences));
        assert_eq!(decoded.len(), 1);
        let detection = &decoded.as_slice()[0];
        assert_eq!(detection.phrase, "");
        assert!(detection.tokens.is_empty());
        assert_eq!(detection.label, "(0.80)");
    }

    #[test]
    fn test_identical_phrases_are_not_merged() {
        let confidences = array![
            [0.0, 0.7, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let decoded = DetectionDecoder::default().decode(&raw(confidences));
        assert_eq!(decoded.labels(), vec!["cat(0.69)", "cat(0.60)"]);
    }

    #[test]
    fn test_boxes_follow_surviving_queries() {
        let confidences = array![
            [0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let decoded = DetectionDecoder::default().decode(&raw(confidences));
        let boxes = decoded.boxes();
        assert_eq!(boxes.len(), 1);
        assert!((boxes[0].cx - 0.1).abs() < 1e-6);
        assert!((boxes[0].h - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_no_queries() {
        let decoded = DetectionDecoder::default().decode(&RawDetections::empty(tokenization()));
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = RawDetections::new(
            Array2::zeros((3, 7)),
            Array2::zeros((2, 4)),
            tokenization(),
            Path::new("img1.png"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Query count mismatch"));

        let err = RawDetections::new(
            Array2::zeros((2, 7)),
            Array2::zeros((2, 3)),
            tokenization(),
            Path::new("img1.png"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("4 columns"));
    }
}
