//! Detector prompt built from extracted tags.

use std::fmt;

/// A detector prompt: lower-cased, trimmed and terminated with a period.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prompt(String);

impl Prompt {
    /// Normalize a separator-joined tag string into a prompt.
    ///
    /// An existing trailing period is not doubled; an empty tag string
    /// becomes `"."`.
    pub fn from_tags(tags: &str) -> Self {
        let mut text = tags.to_lowercase().trim().to_string();
        if !text.ends_with('.') {
            text.push('.');
        }
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the prompt carries no tags.
    pub fn is_empty(&self) -> bool {
        self.0 == "."
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_terminates() {
        assert_eq!(Prompt::from_tags("Cat, Table").as_str(), "cat, table.");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(Prompt::from_tags("  cup  ").as_str(), "cup.");
    }

    #[test]
    fn test_existing_period_not_doubled() {
        assert_eq!(Prompt::from_tags("cup.").as_str(), "cup.");
    }

    #[test]
    fn test_empty_tags() {
        let prompt = Prompt::from_tags("");
        assert_eq!(prompt.as_str(), ".");
        assert!(prompt.is_empty());
    }
}
