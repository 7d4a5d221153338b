//! Per-image annotation artifacts.
//!
//! For each image a folder `<output_dir>/<file_stem>/` receives:
//! - `label.json`: the caption and one mask entry per detection, after a
//!   background entry with value 0
//! - `mask.png`: a 16-bit raster where each pixel holds the value of the last
//!   detection whose box covers it
//! - `overlay.jpg`: the image with every box outlined (optional)

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::config::AnnotationConfig;
use crate::detection::render_confidence;
use crate::error::PipelineError;
use crate::pipeline::LoadedImage;
use crate::types::Detection;

/// Label of the background entry.
const BACKGROUND: &str = "background";

/// Single-channel label raster; one `value` per pixel.
pub type MaskImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Largest `value` the raster can hold.
pub const MAX_MASK_VALUE: usize = u16::MAX as usize;

/// Outline colors, cycled per detection.
const PALETTE: [[u8; 3]; 6] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
];

/// One entry of the `mask` array in `label.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskEntry {
    pub value: u32,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub logit: Option<f32>,
    #[serde(rename = "box", skip_serializing_if = "Option::is_none", default)]
    pub bbox: Option<[f32; 4]>,
}

/// Contents of `label.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub caption: String,
    pub mask: Vec<MaskEntry>,
}

/// Build the structured record for one image.
///
/// Values increment from 1 in emission order; `logit` is the displayed
/// four-character confidence read back as a number and `box` is pixel `xyxy`.
pub fn build_record(
    caption: &str,
    detections: &[Detection],
    width: u32,
    height: u32,
) -> AnnotationRecord {
    let mut mask = vec![MaskEntry {
        value: 0,
        label: BACKGROUND.to_string(),
        logit: None,
        bbox: None,
    }];

    for (idx, detection) in detections.iter().enumerate() {
        let logit = render_confidence(detection.score)
            .parse::<f32>()
            .unwrap_or(detection.score);
        mask.push(MaskEntry {
            value: idx as u32 + 1,
            label: detection.phrase.clone(),
            logit: Some(logit),
            bbox: Some(detection.bbox.to_pixels(width, height)),
        });
    }

    AnnotationRecord {
        caption: caption.to_string(),
        mask,
    }
}

/// Pixel span `[start, end)` of a box edge pair, clamped to `0..limit`.
fn span(lo: f32, hi: f32, limit: u32) -> (u32, u32) {
    let start = lo.floor().max(0.0) as u32;
    let end = (hi.ceil().max(0.0) as u32).min(limit);
    (start.min(limit), end)
}

/// Rasterize detection boxes into a label image.
///
/// Later detections overwrite earlier ones. Callers keep the detection count
/// within [`MAX_MASK_VALUE`]; values past it saturate.
pub fn render_mask(detections: &[Detection], width: u32, height: u32) -> MaskImage {
    let mut mask = MaskImage::new(width, height);
    for (idx, detection) in detections.iter().enumerate() {
        let value = u16::try_from(idx + 1).unwrap_or(u16::MAX);
        let [x0, y0, x1, y1] = detection.bbox.to_pixels(width, height);
        let (xs, xe) = span(x0, x1, width);
        let (ys, ye) = span(y0, y1, height);
        for y in ys..ye {
            for x in xs..xe {
                mask.put_pixel(x, y, Luma([value]));
            }
        }
    }
    mask
}

/// Draw every detection box on a copy of the image.
pub fn render_overlay(image: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.clone();
    let (width, height) = canvas.dimensions();
    for (idx, detection) in detections.iter().enumerate() {
        let [x0, y0, x1, y1] = detection.bbox.to_pixels(width, height);
        let (xs, xe) = span(x0, x1, width);
        let (ys, ye) = span(y0, y1, height);
        if xe <= xs || ye <= ys {
            continue;
        }
        let color = Rgb(PALETTE[idx % PALETTE.len()]);
        let rect = Rect::at(xs as i32, ys as i32).of_size(xe - xs, ye - ys);
        draw_hollow_rect_mut(&mut canvas, rect, color);
    }
    canvas
}

/// Writes annotation folders under a root directory.
///
/// Each folder is written at most once per writer, so two images sharing a
/// file stem cannot clobber each other.
pub struct AnnotationWriter {
    output_dir: PathBuf,
    overlay: bool,
    written: Mutex<HashSet<PathBuf>>,
}

impl AnnotationWriter {
    pub fn new(output_dir: impl Into<PathBuf>, overlay: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            overlay,
            written: Mutex::new(HashSet::new()),
        }
    }

    pub fn from_config(config: &AnnotationConfig) -> Self {
        Self::new(config.output_dir.clone(), config.overlay)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Folder that receives the artifacts of `file_name`.
    pub fn image_dir(&self, file_name: &str) -> PathBuf {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        self.output_dir.join(stem)
    }

    /// Write all artifacts for one image; returns the folder written to.
    pub fn write(
        &self,
        image: &LoadedImage,
        caption: &str,
        detections: &[Detection],
    ) -> Result<PathBuf, PipelineError> {
        let dir = self.image_dir(&image.file_name);
        let err = |message: String| PipelineError::Annotation {
            path: dir.clone(),
            message,
        };

        if detections.len() > MAX_MASK_VALUE {
            return Err(err(format!(
                "{} detections exceed the mask limit of {MAX_MASK_VALUE}",
                detections.len()
            )));
        }

        {
            let mut written = self
                .written
                .lock()
                .map_err(|e| err(format!("Folder registry lock poisoned: {e}")))?;
            if !written.insert(dir.clone()) {
                return Err(err(format!(
                    "Folder already holds annotations of an image with the same stem as {}",
                    image.file_name
                )));
            }
        }

        std::fs::create_dir_all(&dir)
            .map_err(|e| err(format!("Failed to create directory: {e}")))?;

        let record = build_record(caption, detections, image.width, image.height);
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| err(format!("Failed to serialize label.json: {e}")))?;
        std::fs::write(dir.join("label.json"), json)
            .map_err(|e| err(format!("Failed to write label.json: {e}")))?;

        render_mask(detections, image.width, image.height)
            .save(dir.join("mask.png"))
            .map_err(|e| err(format!("Failed to write mask.png: {e}")))?;

        if self.overlay {
            render_overlay(&image.image.to_rgb8(), detections)
                .save(dir.join("overlay.jpg"))
                .map_err(|e| err(format!("Failed to write overlay.jpg: {e}")))?;
        }

        tracing::debug!("Wrote annotations for {} to {:?}", image.file_name, dir);
        Ok(dir)
    }
}
