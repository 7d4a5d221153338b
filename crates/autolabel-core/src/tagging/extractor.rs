//! Caption to noun tags.

use std::path::Path;
use std::sync::Arc;

use crate::config::TaggingConfig;
use crate::error::PipelineError;

use super::lemma::lemmatize;
use super::lexicon::NounLexicon;
use super::pos::PosTagger;
use super::prompt::Prompt;
use super::tokenize::tokenize;

/// Extracts lemmatized noun tags from a caption.
///
/// Tags keep first-occurrence order and duplicates; stop-listing happens
/// later, during aggregation.
#[derive(Debug, Clone)]
pub struct TagExtractor {
    separator: String,
    lexicon: Option<Arc<NounLexicon>>,
}

impl TagExtractor {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            lexicon: None,
        }
    }

    /// Attach a noun lexicon for lemma validation.
    pub fn with_lexicon(mut self, lexicon: Arc<NounLexicon>) -> Self {
        self.lexicon = Some(lexicon).filter(|lex| !lex.is_empty());
        self
    }

    /// Build from config, loading the lexicon from `lexicon_dir` when given.
    pub fn from_config(
        config: &TaggingConfig,
        lexicon_dir: Option<&Path>,
    ) -> Result<Self, PipelineError> {
        let extractor = Self::new(config.separator.clone());
        match lexicon_dir {
            Some(dir) => Ok(extractor.with_lexicon(Arc::new(NounLexicon::load(dir)?))),
            None => Ok(extractor),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// The noun tags of `caption`, in order of appearance.
    pub fn extract_tags(&self, caption: &str) -> Vec<String> {
        let lexicon = self.lexicon.as_deref();
        let tokens = tokenize(caption);
        let tags = PosTagger::new(lexicon).tag(&tokens);

        tokens
            .iter()
            .zip(tags)
            .filter(|(_, tag)| tag.is_noun())
            .map(|(token, tag)| lemmatize(token, tag.is_plural_noun(), lexicon))
            .collect()
    }

    /// The noun tags of `caption`, joined with the separator.
    pub fn extract(&self, caption: &str) -> String {
        self.extract_tags(caption).join(&self.separator)
    }

    /// Tags and the detector prompt built from them.
    pub fn prompt(&self, caption: &str) -> (String, Prompt) {
        let tags = self.extract(caption);
        let prompt = Prompt::from_tags(&tags);
        (tags, prompt)
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat_on_table() {
        assert_eq!(TagExtractor::default().extract("a cat sits on a table"), "cat, table");
    }

    #[test]
    fn test_plural_nouns_are_lemmatized() {
        assert_eq!(
            TagExtractor::default().extract("two men holding coffee cups at a wooden desk"),
            "man, coffee, cup, desk"
        );
    }

    #[test]
    fn test_duplicates_kept_in_order() {
        assert_eq!(
            TagExtractor::default().extract("a cup next to another cup and a plate"),
            "cup, cup, plate"
        );
    }

    #[test]
    fn test_noun_less_caption() {
        let (tags, prompt) = TagExtractor::default().prompt("it is very bright");
        assert_eq!(tags, "");
        assert_eq!(prompt.as_str(), ".");
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(
            TagExtractor::new(" . ").extract("a dog with a ball"),
            "dog . ball"
        );
    }

    #[test]
    fn test_prompt_from_caption() {
        let (_, prompt) = TagExtractor::default().prompt("A Robot arm picks up the red mug.");
        assert_eq!(prompt.as_str(), "robot, arm, mug.");
    }

    #[test]
    fn test_lexicon_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wordnet_nouns.txt"), "house\nglass\n").unwrap();
        let extractor =
            TagExtractor::from_config(&TaggingConfig::default(), Some(dir.path())).unwrap();
        assert_eq!(extractor.extract("two houses"), "house");
    }
}
