//! Captions read from a file prepared ahead of time.
//!
//! Two layouts are accepted: a JSON object mapping file name to caption, or
//! one `file_name<TAB>caption` pair per line.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::CaptionSource;
use crate::error::PipelineError;
use crate::pipeline::LoadedImage;

/// Caption source backed by an in-memory map keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct SidecarCaptions {
    captions: HashMap<String, String>,
}

impl SidecarCaptions {
    /// Load captions from a JSON or TSV file.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Caption {
            path: path.to_path_buf(),
            message: format!("Failed to read caption file: {e}"),
            status_code: None,
        })?;
        let sidecar = Self::parse(&content).map_err(|message| PipelineError::Caption {
            path: path.to_path_buf(),
            message,
            status_code: None,
        })?;
        tracing::info!("Loaded {} captions from {:?}", sidecar.len(), path);
        Ok(sidecar)
    }

    /// Parse caption file contents, detecting the layout.
    pub fn parse(content: &str) -> Result<Self, String> {
        if content.trim_start().starts_with('{') {
            let captions: HashMap<String, String> = serde_json::from_str(content)
                .map_err(|e| format!("Invalid JSON caption file: {e}"))?;
            return Ok(Self { captions });
        }

        let mut captions = HashMap::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (name, caption) = line
                .split_once('\t')
                .ok_or_else(|| format!("Line {}: expected file_name<TAB>caption", lineno + 1))?;
            captions.insert(name.trim().to_string(), caption.trim().to_string());
        }
        Ok(Self { captions })
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.captions.get(file_name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SidecarCaptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            captions: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl CaptionSource for SidecarCaptions {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn caption(&self, image: &LoadedImage) -> Result<String, PipelineError> {
        self.get(&image.file_name)
            .map(String::from)
            .ok_or_else(|| PipelineError::Caption {
                path: image.path.clone(),
                message: format!("No caption for {}", image.file_name),
                status_code: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let sidecar = SidecarCaptions::parse(r#"{"img1.png": "a cat", "img2.png": "a cup"}"#)
            .unwrap();
        assert_eq!(sidecar.len(), 2);
        assert_eq!(sidecar.get("img2.png"), Some("a cup"));
    }

    #[test]
    fn test_parse_tsv() {
        let sidecar =
            SidecarCaptions::parse("# captions\nimg1.png\ta cat on a mat\n\nimg2.png\ta cup\n")
                .unwrap();
        assert_eq!(sidecar.get("img1.png"), Some("a cat on a mat"));
        assert_eq!(sidecar.len(), 2);
    }

    #[test]
    fn test_parse_tsv_malformed() {
        let err = SidecarCaptions::parse("img1.png a cat").unwrap_err();
        assert!(err.contains("Line 1"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SidecarCaptions::load(Path::new("/definitely/missing/captions.json"));
        assert!(matches!(result, Err(PipelineError::Caption { .. })));
    }
}
