//! Image loading with format detection, limits, and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

use super::discovery::DiscoveredFile;

/// One decoded image, alive for the duration of its processing.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Full path to the file
    pub path: PathBuf,
    /// File name within the corpus directory
    pub file_name: String,
    /// Decoded pixels, shared with the blocking detector task
    pub image: Arc<DynamicImage>,
    /// Original encoded bytes (sent as-is to network caption sources)
    pub bytes: Arc<Vec<u8>>,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Image loader with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode a discovered file.
    pub async fn load(&self, file: &DiscoveredFile) -> Result<LoadedImage, PipelineError> {
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if file.size > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: file.path.clone(),
                size_mb: file.size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = tokio::fs::read(&file.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(file.path.clone()),
            _ => PipelineError::Decode {
                path: file.path.clone(),
                message: format!("Failed to read file: {e}"),
            },
        })?;

        self.decode_from_bytes(bytes, &file.path, &file.file_name).await
    }

    /// Decode an in-memory buffer with validation and timeout.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
        file_name: &str,
    ) -> Result<LoadedImage, PipelineError> {
        let bytes = Arc::new(bytes);
        let shared = Arc::clone(&bytes);
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || decode_bytes_sync(&shared, &path_owned)).await
        })
        .await;

        let (image, format) = match decode_result {
            Ok(Ok(Ok(decoded))) => decoded,
            Ok(Ok(Err(e))) => return Err(e),
            Ok(Err(e)) => {
                return Err(PipelineError::Decode {
                    path: path.to_path_buf(),
                    message: format!("Task join error: {}", e),
                })
            }
            Err(_) => {
                return Err(PipelineError::Timeout {
                    path: path.to_path_buf(),
                    stage: "decode".to_string(),
                    timeout_ms: self.limits.decode_timeout_ms,
                })
            }
        };

        let (width, height) = image.dimensions();
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        Ok(LoadedImage {
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            image: Arc::new(image),
            bytes,
            format,
            width,
            height,
        })
    }
}

/// Synchronous decode (runs in spawn_blocking).
fn decode_bytes_sync(
    bytes: &[u8],
    path: &Path,
) -> Result<(DynamicImage, ImageFormat), PipelineError> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let format = match reader.format() {
        Some(f) => f,
        None => ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?,
    };
    let image = reader.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok((image, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_decode_detects_format_by_content() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let loaded = decoder
            .decode_from_bytes(png_bytes(4, 3), Path::new("img1.jpg"), "img1.jpg")
            .await
            .unwrap();
        assert_eq!(loaded.format, ImageFormat::Png);
        assert_eq!((loaded.width, loaded.height), (4, 3));
        assert_eq!(loaded.file_name, "img1.jpg");
    }

    #[tokio::test]
    async fn test_decode_rejects_oversized_dimensions() {
        let limits = LimitsConfig {
            max_image_dimension: 8,
            ..LimitsConfig::default()
        };
        let err = ImageDecoder::new(limits)
            .decode_from_bytes(png_bytes(16, 4), Path::new("img1.png"), "img1.png")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_decode_garbage_fails() {
        let err = ImageDecoder::new(LimitsConfig::default())
            .decode_from_bytes(b"not an image".to_vec(), Path::new("img1.png"), "img1.png")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Decode { .. } | PipelineError::UnsupportedFormat { .. }
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let file = DiscoveredFile {
            path: PathBuf::from("/definitely/missing/img1.png"),
            file_name: "img1.png".to_string(),
            ordering_key: 1,
            size: 10,
        };
        let err = ImageDecoder::new(LimitsConfig::default())
            .load(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }
}
