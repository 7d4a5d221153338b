//! Treebank-style word tokenization for captions.
//!
//! Punctuation is split off the edges of words, and contractions are split
//! into their clitics (`dog's` becomes `dog` + `'s`, `isn't` becomes `is` +
//! `n't`). Word-internal hyphens and apostrophes that are not clitics stay.

const CLITICS: &[&str] = &["'s", "'re", "'ve", "'ll", "'d", "'m"];

const LEADING: &[char] = &['(', '[', '{', '"', '`', '\'', '<'];

const TRAILING: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\'', '>', '…',
];

/// Split a caption into word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.replace(['\u{2019}', '\u{2018}'], "'");
    let mut tokens = Vec::new();

    for chunk in normalized.split_whitespace() {
        let mut word = chunk;
        let mut leading = Vec::new();
        let mut trailing = Vec::new();

        while let Some(ch) = word.chars().next().filter(|c| LEADING.contains(c)) {
            leading.push(ch.to_string());
            word = &word[ch.len_utf8()..];
        }
        while let Some(ch) = word.chars().last().filter(|c| TRAILING.contains(c)) {
            trailing.push(ch.to_string());
            word = &word[..word.len() - ch.len_utf8()];
        }

        tokens.extend(leading);
        if !word.is_empty() {
            split_clitics(word, &mut tokens);
        }
        tokens.extend(trailing.into_iter().rev());
    }

    tokens
}

fn split_clitics(word: &str, out: &mut Vec<String>) {
    let lower = word.to_lowercase();

    if lower.len() > 3 && lower.ends_with("n't") {
        let cut = word.len() - 3;
        out.push(word[..cut].to_string());
        out.push(word[cut..].to_string());
        return;
    }

    for clitic in CLITICS {
        if lower.len() > clitic.len() && lower.ends_with(clitic) {
            let cut = word.len() - clitic.len();
            if word.is_char_boundary(cut) {
                out.push(word[..cut].to_string());
                out.push(word[cut..].to_string());
                return;
            }
        }
    }

    out.push(word.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_trailing_punctuation() {
        assert_eq!(
            tokenize("a cat, a dog."),
            vec!["a", "cat", ",", "a", "dog", "."]
        );
    }

    #[test]
    fn test_splits_possessive_and_negation() {
        assert_eq!(
            tokenize("the man's hand isn't visible"),
            vec!["the", "man", "'s", "hand", "is", "n't", "visible"]
        );
    }

    #[test]
    fn test_keeps_hyphenated_words() {
        assert_eq!(tokenize("a t-shirt"), vec!["a", "t-shirt"]);
    }

    #[test]
    fn test_quotes_and_brackets() {
        assert_eq!(
            tokenize("(a \"red\" cup)"),
            vec!["(", "a", "\"", "red", "\"", "cup", ")"]
        );
    }

    #[test]
    fn test_curly_apostrophe() {
        assert_eq!(tokenize("dog\u{2019}s bowl"), vec!["dog", "'s", "bowl"]);
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("   ").is_empty());
    }
}
