//! Normalized detector boxes, pixel conversion and non-maximum suppression.

use serde::{Deserialize, Serialize};

use crate::types::Detection;

/// A box in normalized center format, as emitted by the detector.
///
/// All four values are fractions of the image size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self { cx, cy, w, h }
    }

    /// Corner coordinates `[x0, y0, x1, y1]`, still normalized.
    pub fn xyxy(&self) -> [f32; 4] {
        [
            self.cx - self.w / 2.0,
            self.cy - self.h / 2.0,
            self.cx + self.w / 2.0,
            self.cy + self.h / 2.0,
        ]
    }

    /// Corner coordinates scaled to an image of `width` x `height` pixels.
    pub fn to_pixels(&self, width: u32, height: u32) -> [f32; 4] {
        let [x0, y0, x1, y1] = self.xyxy();
        let (w, h) = (width as f32, height as f32);
        [x0 * w, y0 * h, x1 * w, y1 * h]
    }

    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let [ax0, ay0, ax1, ay1] = self.xyxy();
        let [bx0, by0, bx1, by1] = other.xyxy();
        let iw = (ax1.min(bx1) - ax0.max(bx0)).max(0.0);
        let ih = (ay1.min(by1) - ay0.max(by0)).max(0.0);
        let intersection = iw * ih;
        let union = self.area() + other.area() - intersection;
        if union <= f32::EPSILON {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Greedy class-agnostic non-maximum suppression.
///
/// Keeps the highest-scoring detection of every group overlapping above
/// `iou_threshold`. The survivors keep their original relative order.
pub fn non_maximum_suppression(detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut order: Vec<usize> = (0..detections.len()).collect();
    order.sort_by(|&a, &b| {
        detections[b]
            .score
            .partial_cmp(&detections[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut suppressed = vec![false; detections.len()];
    for (rank, &current) in order.iter().enumerate() {
        if suppressed[current] {
            continue;
        }
        for &other in &order[rank + 1..] {
            if !suppressed[other]
                && detections[current].bbox.iou(&detections[other].bbox) > iou_threshold
            {
                suppressed[other] = true;
            }
        }
    }

    detections
        .into_iter()
        .zip(suppressed)
        .filter_map(|(detection, dropped)| (!dropped).then_some(detection))
        .collect()
}
