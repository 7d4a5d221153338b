//! Image preprocessing for Grounding DINO.
//!
//! The detector expects:
//! - Short side resized to 800 pixels, long side capped at 1333
//! - Bilinear resampling
//! - ImageNet normalization: `(pixel / 255 - mean) / std`
//! - Channel order: RGB
//! - Tensor layout: NCHW [1, 3, height, width]

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// ImageNet per-channel mean.
const NORM_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation.
const NORM_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Output `(width, height)` for an image of `width` x `height`.
///
/// The short side becomes `short_side` unless that would push the long side
/// past `max_side`, in which case the short side shrinks so the long side
/// lands on `max_side`. Aspect ratio is preserved; sizes are truncated.
pub fn target_size(width: u32, height: u32, short_side: u32, max_side: u32) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let (min_orig, max_orig) = (w.min(h), w.max(h));
    let mut size = short_side as f64;

    if max_orig / min_orig * size > max_side as f64 {
        size = (max_side as f64 * min_orig / max_orig).round();
    }

    if (width <= height && width as f64 == size) || (height <= width && height as f64 == size) {
        return (width, height);
    }

    let (ow, oh) = if width < height {
        (size, size * h / w)
    } else {
        (size * w / h, size)
    };
    ((ow as u32).max(1), (oh as u32).max(1))
}

/// Preprocess an image for detector inference.
///
/// Returns the normalized NCHW tensor.
pub fn preprocess(image: &DynamicImage, short_side: u32, max_side: u32) -> Array4<f32> {
    let (tw, th) = target_size(image.width(), image.height(), short_side, max_side);
    let resized = image.resize_exact(tw, th, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let (width, height) = (tw as usize, th as usize);
    let plane = width * height;
    let mut data = vec![0.0f32; CHANNELS * plane];

    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        for (c, &val) in pixel.iter().enumerate() {
            data[c * plane + i] = (val as f32 / 255.0 - NORM_MEAN[c]) / NORM_STD[c];
        }
    }

    Array4::from_shape_vec((1, CHANNELS, height, width), data)
        .unwrap_or_else(|_| Array4::zeros((1, CHANNELS, height, width)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_target_size_short_side_rule() {
        assert_eq!(target_size(640, 480, 800, 1333), (1066, 800));
        assert_eq!(target_size(480, 640, 800, 1333), (800, 1066));
    }

    #[test]
    fn test_target_size_long_side_cap() {
        assert_eq!(target_size(2000, 500, 800, 1333), (1332, 333));
    }

    #[test]
    fn test_target_size_already_sized() {
        assert_eq!(target_size(1200, 800, 800, 1333), (1200, 800));
    }

    #[test]
    fn test_preprocess_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 48));
        let tensor = preprocess(&img, 80, 1333);
        assert_eq!(tensor.shape(), &[1, 3, 80, 106]);
    }

    #[test]
    fn test_preprocess_normalization() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([255, 0, 0])));
        let tensor = preprocess(&img, 8, 8);
        let red = tensor[[0, 0, 0, 0]];
        let green = tensor[[0, 1, 0, 0]];
        assert!((red - (1.0 - 0.485) / 0.229).abs() < 1e-4);
        assert!((green - (-0.456 / 0.224)).abs() < 1e-4);
    }
}
