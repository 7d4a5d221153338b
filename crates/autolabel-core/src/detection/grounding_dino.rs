//! Grounding DINO ONNX session management and inference.
//!
//! Loads a Grounding DINO export together with its BERT `tokenizer.json` and
//! runs one forward pass per image. Inputs follow the reference export:
//! `img`, `input_ids`, `attention_mask`, `position_ids`, `token_type_ids` and
//! `text_token_mask`; outputs are `logits` (pre-sigmoid) and `boxes`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Value;
use tokenizers::Tokenizer;

use crate::config::DetectionConfig;
use crate::error::PipelineError;
use crate::tagging::Prompt;

use super::decoder::RawDetections;
use super::preprocess::preprocess;
use super::text_mask::{sub_sentence_masks, SpecialTokenIds};
use super::tokenization::PromptTokenization;
use super::DetectionSource;

/// The detector ONNX model filename.
const MODEL_FILENAME: &str = "model.onnx";

/// The BERT tokenizer filename.
const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Grounding DINO detector backed by ONNX Runtime.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct GroundingDino {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    special_ids: SpecialTokenIds,
    max_text_len: usize,
    short_side: u32,
    max_side: u32,
}

impl GroundingDino {
    /// Load the detector from `{model_dir}/{model}/`.
    pub fn load(config: &DetectionConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let model_path = Self::model_path(config, model_dir);
        let tokenizer_path = Self::tokenizer_path(config, model_dir);

        if !model_path.exists() {
            return Err(PipelineError::Model {
                message: format!(
                    "Detector model not found at {}. See `autolabel models path`.",
                    model_path.display()
                ),
            });
        }
        if !tokenizer_path.exists() {
            return Err(PipelineError::Model {
                message: format!("Tokenizer not found at {}", tokenizer_path.display()),
            });
        }

        if config.device == "cuda" {
            tracing::warn!("CUDA execution provider not available in this build, using CPU");
        }

        tracing::info!("Loading Grounding DINO from {:?}", model_path);
        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(&model_path)
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to load ONNX model {}: {e}", model_path.display()),
            })?;

        tracing::debug!(
            "Detector inputs: {:?}, outputs: {:?}",
            session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
            session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>()
        );

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| PipelineError::Model {
            message: format!("Failed to load tokenizer {}: {e}", tokenizer_path.display()),
        })?;
        let special_ids = SpecialTokenIds::from_tokenizer(&tokenizer);
        tracing::info!("Grounding DINO loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            special_ids,
            max_text_len: config.max_text_len,
            short_side: config.resize_short_side,
            max_side: config.resize_max_side,
        })
    }

    /// Check whether both model files exist on disk.
    pub fn model_exists(config: &DetectionConfig, model_dir: &Path) -> bool {
        Self::model_path(config, model_dir).exists()
            && Self::tokenizer_path(config, model_dir).exists()
    }

    pub fn model_path(config: &DetectionConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(MODEL_FILENAME)
    }

    pub fn tokenizer_path(config: &DetectionConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(TOKENIZER_FILENAME)
    }

    fn detection_error(path: &Path, message: String) -> PipelineError {
        PipelineError::Detection {
            path: path.to_path_buf(),
            message,
        }
    }
}

impl DetectionSource for GroundingDino {
    fn name(&self) -> &str {
        "grounding-dino"
    }

    fn detect(
        &self,
        image: &DynamicImage,
        prompt: &Prompt,
        path: &Path,
    ) -> Result<RawDetections, PipelineError> {
        let encoding = self
            .tokenizer
            .encode(prompt.as_str(), true)
            .map_err(|e| Self::detection_error(path, format!("Tokenization failed: {e}")))?;

        let len = encoding.len().min(self.max_text_len);
        let to_i64 = |values: &[u32]| -> Vec<i64> {
            values[..len].iter().map(|&v| i64::from(v)).collect()
        };
        let input_ids = to_i64(encoding.get_ids());
        let attention_mask = to_i64(encoding.get_attention_mask());
        let token_type_ids = to_i64(encoding.get_type_ids());
        let masks = sub_sentence_masks(&input_ids, &self.special_ids);

        let mut tokenization = PromptTokenization::from_encoding(prompt.as_str(), &encoding);
        if tokenization.len() > len {
            let tokens = tokenization.tokens()[..len].to_vec();
            tokenization = PromptTokenization::new(prompt.as_str(), tokens);
        }

        let tensor = preprocess(image, self.short_side, self.max_side);
        let img_shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let img_data: Vec<f32> = tensor.iter().copied().collect();
        let text_shape = vec![1i64, len as i64];

        let tensor_err = |e: ort::Error| {
            Self::detection_error(path, format!("Failed to create input tensor: {e}"))
        };
        let img = Value::from_array((img_shape, img_data)).map_err(tensor_err)?;
        let ids = Value::from_array((text_shape.clone(), input_ids)).map_err(tensor_err)?;
        let attention =
            Value::from_array((text_shape.clone(), attention_mask)).map_err(tensor_err)?;
        let positions =
            Value::from_array((text_shape.clone(), masks.position_ids)).map_err(tensor_err)?;
        let types = Value::from_array((text_shape, token_type_ids)).map_err(tensor_err)?;
        let text_mask = Value::from_array((vec![1i64, len as i64, len as i64], masks.attention))
            .map_err(tensor_err)?;

        let inputs = ort::inputs![
            "img" => img,
            "input_ids" => ids,
            "attention_mask" => attention,
            "position_ids" => positions,
            "token_type_ids" => types,
            "text_token_mask" => text_mask,
        ];

        let mut session = self
            .session
            .lock()
            .map_err(|e| Self::detection_error(path, format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| Self::detection_error(path, format!("ONNX inference failed: {e}")))?;

        let logits = outputs
            .iter()
            .find(|(name, _)| *name == "logits")
            .ok_or_else(|| Self::detection_error(path, "Model did not produce logits".into()))?;
        let (logit_shape, logit_data) = logits.1.try_extract_tensor::<f32>().map_err(|e| {
            Self::detection_error(path, format!("Failed to extract logits tensor: {e}"))
        })?;

        let boxes = outputs
            .iter()
            .find(|(name, _)| *name == "boxes")
            .ok_or_else(|| Self::detection_error(path, "Model did not produce boxes".into()))?;
        let (box_shape, box_data) = boxes.1.try_extract_tensor::<f32>().map_err(|e| {
            Self::detection_error(path, format!("Failed to extract boxes tensor: {e}"))
        })?;

        if logit_shape.len() != 3 || box_shape.len() != 3 {
            return Err(Self::detection_error(
                path,
                format!("Unexpected output shapes: logits {logit_shape:?}, boxes {box_shape:?}"),
            ));
        }

        let (queries, vocab) = (logit_shape[1] as usize, logit_shape[2] as usize);
        let confidences: Vec<f32> = logit_data.iter().map(|&x| sigmoid(x)).collect();
        let confidences = Array2::from_shape_vec((queries, vocab), confidences)
            .map_err(|e| Self::detection_error(path, format!("Malformed logits: {e}")))?;
        let boxes = Array2::from_shape_vec(
            (box_shape[1] as usize, box_shape[2] as usize),
            box_data.to_vec(),
        )
        .map_err(|e| Self::detection_error(path, format!("Malformed boxes: {e}")))?;

        RawDetections::new(confidences, boxes, tokenization, path)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_model_paths() {
        let config = DetectionConfig::default();
        let dir = Path::new("/models");
        assert_eq!(
            GroundingDino::model_path(&config, dir),
            PathBuf::from("/models/groundingdino-swint-ogc/model.onnx")
        );
        assert!(!GroundingDino::model_exists(&config, dir));
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let result = GroundingDino::load(&DetectionConfig::default(), dir.path());
        assert!(matches!(result, Err(PipelineError::Model { .. })));
    }
}
