//! Caption tag extraction.
//!
//! Turns a free-text caption into lemmatized noun tags and the detector
//! prompt built from them: tokenize, part-of-speech tag, keep nouns,
//! lemmatize, join.

pub mod extractor;
pub mod lemma;
pub mod lexicon;
pub mod pos;
pub mod prompt;
pub mod tokenize;

pub use extractor::TagExtractor;
pub use lexicon::NounLexicon;
pub use pos::{PosTag, PosTagger};
pub use prompt::Prompt;
