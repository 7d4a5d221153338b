//! Optional WordNet noun lexicon.
//!
//! Loads `wordnet_nouns.txt` from a directory: one noun per line, first
//! tab-separated column, `#` comments allowed. Multi-word nouns keep their
//! underscores.

use std::collections::HashSet;
use std::path::Path;

use crate::error::PipelineError;

/// File name looked up inside the lexicon directory.
pub const LEXICON_FILENAME: &str = "wordnet_nouns.txt";

/// Set of known noun lemmas.
#[derive(Debug, Clone, Default)]
pub struct NounLexicon {
    nouns: HashSet<String>,
}

impl NounLexicon {
    /// Load the lexicon from `dir`.
    ///
    /// A missing file yields an empty lexicon; only I/O failures are errors.
    pub fn load(dir: &Path) -> Result<Self, PipelineError> {
        let path = dir.join(LEXICON_FILENAME);
        if !path.exists() {
            tracing::debug!("No noun lexicon at {:?}", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| PipelineError::Model {
            message: format!("Failed to read {:?}: {}", path, e),
        })?;
        let lexicon = Self::parse(&content);
        tracing::info!("Loaded noun lexicon: {} terms", lexicon.len());
        Ok(lexicon)
    }

    /// Parse lexicon file contents.
    pub fn parse(content: &str) -> Self {
        content
            .lines()
            .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
            .filter_map(|line| line.split('\t').next())
            .map(|name| name.trim().to_lowercase())
            .collect()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.nouns.contains(word)
    }

    pub fn len(&self) -> usize {
        self.nouns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nouns.is_empty()
    }
}

impl FromIterator<String> for NounLexicon {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            nouns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_column() {
        let lexicon = NounLexicon::parse(
            "# nouns\ncup\t03147509\tcontainer|instrumentality\n\nglass\nice_cream\t07614500\n",
        );
        assert_eq!(lexicon.len(), 3);
        assert!(lexicon.contains("cup"));
        assert!(lexicon.contains("ice_cream"));
        assert!(!lexicon.contains("# nouns"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lexicon = NounLexicon::load(dir.path()).unwrap();
        assert!(lexicon.is_empty());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LEXICON_FILENAME), "mug\nkettle\n").unwrap();
        let lexicon = NounLexicon::load(dir.path()).unwrap();
        assert!(lexicon.contains("kettle"));
    }
}
