//! Corpus discovery and numeric ordering.
//!
//! A corpus is the flat listing of a directory, filtered by supported
//! extension and ordered by the first run of digits in each file name, so
//! `img2.png` comes before `img10.png`.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::PipelineError;

/// Discovers and orders the images of a corpus directory.
pub struct CorpusDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File name within the corpus directory
    pub file_name: String,
    /// First integer in the file name
    pub ordering_key: u64,
    /// File size in bytes
    pub size: u64,
}

impl CorpusDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List the supported files directly inside `dir`, in corpus order.
    ///
    /// Any file name without a number fails the whole listing.
    pub fn discover(&self, dir: &Path) -> Result<Vec<DiscoveredFile>, PipelineError> {
        if !dir.exists() {
            return Err(PipelineError::FileNotFound(dir.to_path_buf()));
        }
        if !dir.is_dir() {
            return Err(PipelineError::NotADirectory(dir.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !self.is_supported(path) {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let ordering_key = ordering_key(&file_name)?;
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(DiscoveredFile {
                path: path.to_path_buf(),
                file_name,
                ordering_key,
                size,
            });
        }

        files.sort_by(|a, b| {
            a.ordering_key
                .cmp(&b.ordering_key)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        tracing::debug!("Discovered {} images in {:?}", files.len(), dir);
        Ok(files)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

/// The first run of ASCII digits in `name`, parsed as an integer.
pub fn ordering_key(name: &str) -> Result<u64, PipelineError> {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return Err(PipelineError::UnorderableFilename {
            name: name.to_string(),
            reason: "no digits in file name".to_string(),
        });
    }
    digits
        .parse::<u64>()
        .map_err(|e| PipelineError::UnorderableFilename {
            name: name.to_string(),
            reason: format!("number {digits} out of range: {e}"),
        })
}

/// Sort bare file names into corpus order.
pub fn order_file_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, PipelineError> {
    let mut keyed = names
        .iter()
        .map(|name| ordering_key(name.as_ref()).map(|key| (key, name.as_ref().to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    keyed.sort();
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexicographic() {
        assert_eq!(
            order_file_names(&["img10.png", "img2.png", "img1.png"]).unwrap(),
            vec!["img1.png", "img2.png", "img10.png"]
        );
    }

    #[test]
    fn test_first_digit_run_wins() {
        assert_eq!(ordering_key("cam2_frame0100.jpg").unwrap(), 2);
        assert_eq!(ordering_key("007.png").unwrap(), 7);
    }

    #[test]
    fn test_ties_break_by_name() {
        assert_eq!(
            order_file_names(&["b1.png", "a1.png", "a01.png"]).unwrap(),
            vec!["a01.png", "a1.png", "b1.png"]
        );
    }

    #[test]
    fn test_no_digits_is_error() {
        let err = ordering_key("cover.png").unwrap_err();
        assert!(matches!(err, PipelineError::UnorderableFilename { .. }));
        assert!(err.to_string().contains("cover.png"));
    }

    #[test]
    fn test_overflow_is_error() {
        assert!(ordering_key("img99999999999999999999999.png").is_err());
    }

    #[test]
    fn test_is_supported() {
        let discovery = CorpusDiscovery::new(ProcessingConfig::default());
        assert!(discovery.is_supported(Path::new("img1.jpg")));
        assert!(discovery.is_supported(Path::new("img1.PNG")));
        assert!(!discovery.is_supported(Path::new("img1.txt")));
    }

    #[test]
    fn test_discover_orders_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["img10.png", "img2.png", "img1.jpg", "notes1.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub3")).unwrap();
        std::fs::write(dir.path().join("sub3").join("img0.png"), b"x").unwrap();

        let files = CorpusDiscovery::new(ProcessingConfig::default())
            .discover(dir.path())
            .unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["img1.jpg", "img2.png", "img10.png"]);
        assert_eq!(CorpusDiscovery::total_size(&files), 3);
    }

    #[test]
    fn test_discover_unorderable_aborts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("img1.png"), b"x").unwrap();
        std::fs::write(dir.path().join("cover.png"), b"x").unwrap();
        let result = CorpusDiscovery::new(ProcessingConfig::default()).discover(dir.path());
        assert!(matches!(
            result,
            Err(PipelineError::UnorderableFilename { .. })
        ));
    }

    #[test]
    fn test_discover_missing_dir() {
        let result = CorpusDiscovery::new(ProcessingConfig::default())
            .discover(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(PipelineError::FileNotFound(_))));
    }
}
