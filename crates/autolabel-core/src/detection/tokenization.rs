//! Prompt tokenization and phrase reconstruction from token activation masks.
//!
//! A detector attributes each query to prompt tokens through a per-position
//! activation vector. [`PromptTokenization`] remembers where every token came
//! from in the prompt so a boolean mask over positions can be turned back into
//! prompt text.
//!
//! Merge rule for [`PromptTokenization::decode`]:
//! - special tokens never contribute,
//! - punctuation-only tokens are dropped,
//! - a token whose span starts where the previously emitted token ended is
//!   glued on without a space (sub-word pieces re-form their word),
//! - any other token is separated by a single space.

use std::ops::Range;

/// One token position of the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptToken {
    /// Byte span in the prompt; empty for special tokens
    pub span: Range<usize>,
    /// `[CLS]`, `[SEP]`, padding and the like
    pub special: bool,
}

impl PromptToken {
    pub fn word(span: Range<usize>) -> Self {
        Self {
            span,
            special: false,
        }
    }

    pub fn special() -> Self {
        Self {
            span: 0..0,
            special: true,
        }
    }
}

/// The prompt together with its token boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTokenization {
    prompt: String,
    tokens: Vec<PromptToken>,
}

impl PromptTokenization {
    /// Build from explicit token spans.
    ///
    /// Spans that fall outside the prompt or off a char boundary are treated
    /// as special tokens.
    pub fn new(prompt: impl Into<String>, tokens: Vec<PromptToken>) -> Self {
        let prompt = prompt.into();
        let tokens = tokens
            .into_iter()
            .map(|token| {
                let valid = token.span.start <= token.span.end
                    && prompt.get(token.span.clone()).is_some();
                if token.special || !valid {
                    PromptToken::special()
                } else {
                    token
                }
            })
            .collect();
        Self { prompt, tokens }
    }

    /// Build from a Hugging Face tokenizer encoding of `prompt`.
    pub fn from_encoding(prompt: &str, encoding: &tokenizers::Encoding) -> Self {
        let tokens = encoding
            .get_offsets()
            .iter()
            .zip(encoding.get_special_tokens_mask())
            .map(|(&(start, end), &special)| {
                if special == 1 || start == end {
                    PromptToken::special()
                } else {
                    PromptToken::word(start..end)
                }
            })
            .collect();
        Self::new(prompt, tokens)
    }

    /// BERT-style basic tokenization without a vocabulary.
    ///
    /// Splits on whitespace, makes every punctuation character its own token
    /// and wraps the result in `[CLS]` / `[SEP]`. Used when no tokenizer file is
    /// available and by detectors that work on whole words.
    pub fn basic(prompt: &str) -> Self {
        let mut tokens = vec![PromptToken::special()];
        let mut word_start: Option<usize> = None;

        for (idx, ch) in prompt.char_indices() {
            if ch.is_whitespace() || is_punctuation(ch) {
                if let Some(start) = word_start.take() {
                    tokens.push(PromptToken::word(start..idx));
                }
                if is_punctuation(ch) {
                    tokens.push(PromptToken::word(idx..idx + ch.len_utf8()));
                }
            } else if word_start.is_none() {
                word_start = Some(idx);
            }
        }
        if let Some(start) = word_start {
            tokens.push(PromptToken::word(start..prompt.len()));
        }
        tokens.push(PromptToken::special());

        Self::new(prompt, tokens)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn tokens(&self) -> &[PromptToken] {
        &self.tokens
    }

    /// Number of token positions, special tokens included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Prompt text of the token at `position`; empty for special tokens.
    pub fn token_text(&self, position: usize) -> &str {
        self.tokens
            .get(position)
            .filter(|t| !t.special)
            .and_then(|t| self.prompt.get(t.span.clone()))
            .unwrap_or("")
    }

    /// Decode an activation mask into the phrase it selects.
    ///
    /// Mask positions beyond the tokenization are ignored.
    pub fn decode(&self, mask: &[bool]) -> String {
        let mut phrase = String::new();
        let mut last_end: Option<usize> = None;

        for (token, _) in self.tokens.iter().zip(mask).filter(|&(_, &on)| on) {
            if token.special {
                continue;
            }
            let text = &self.prompt[token.span.clone()];
            if text.chars().all(is_punctuation) {
                continue;
            }
            match last_end {
                Some(end) if end == token.span.start => {}
                Some(_) => phrase.push(' '),
                None => {}
            }
            phrase.push_str(text);
            last_end = Some(token.span.end);
        }

        phrase
    }
}

/// ASCII punctuation plus the Unicode punctuation categories BERT splits on.
pub(crate) fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation()
        || matches!(
            ch,
            '\u{2010}'..='\u{2027}' | '\u{2030}'..='\u{205E}' | '\u{3000}'..='\u{303F}'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(len: usize, on: &[usize]) -> Vec<bool> {
        (0..len).map(|i| on.contains(&i)).collect()
    }

    #[test]
    fn test_basic_tokenization_positions() {
        let tok = PromptTokenization::basic("cat, coffee cup.");
        let texts: Vec<&str> = (0..tok.len()).map(|i| tok.token_text(i)).collect();
        assert_eq!(texts, vec!["", "cat", ",", "coffee", "cup", ".", ""]);
        assert!(tok.tokens()[0].special);
        assert!(tok.tokens()[6].special);
    }

    #[test]
    fn test_adjacent_words_round_trip() {
        let tok = PromptTokenization::basic("cat, coffee cup.");
        assert_eq!(tok.decode(&mask(tok.len(), &[3, 4])), "coffee cup");
    }

    #[test]
    fn test_non_adjacent_words_are_space_joined() {
        let tok = PromptTokenization::basic("cat, coffee cup.");
        assert_eq!(tok.decode(&mask(tok.len(), &[1, 4])), "cat cup");
    }

    #[test]
    fn test_punctuation_and_special_tokens_suppressed() {
        let tok = PromptTokenization::basic("cat, coffee cup.");
        assert_eq!(tok.decode(&mask(tok.len(), &[0, 2, 5, 6])), "");
        assert_eq!(tok.decode(&mask(tok.len(), &[0, 1, 2, 6])), "cat");
    }

    #[test]
    fn test_all_false_mask_decodes_empty() {
        let tok = PromptTokenization::basic("cat.");
        assert_eq!(tok.decode(&vec![false; 256]), "");
    }

    #[test]
    fn test_mask_longer_than_tokens_is_ignored_past_end() {
        let tok = PromptTokenization::basic("cat.");
        let mut m = vec![true; 256];
        m[0] = false;
        assert_eq!(tok.decode(&m), "cat");
    }

    #[test]
    fn test_subword_pieces_merge() {
        // "skateboard" split as "skate" + "##board" by a WordPiece vocabulary
        let prompt = "skateboard, dog.";
        let tok = PromptTokenization::new(
            prompt,
            vec![
                PromptToken::special(),
                PromptToken::word(0..5),
                PromptToken::word(5..10),
                PromptToken::word(10..11),
                PromptToken::word(12..15),
                PromptToken::word(15..16),
                PromptToken::special(),
            ],
        );
        assert_eq!(tok.decode(&mask(tok.len(), &[1, 2])), "skateboard");
        assert_eq!(tok.decode(&mask(tok.len(), &[1, 2, 4])), "skateboard dog");
        assert_eq!(tok.decode(&mask(tok.len(), &[2])), "board");
    }

    #[test]
    fn test_out_of_range_spans_become_special() {
        let tok = PromptTokenization::new("cat.", vec![PromptToken::word(0..40)]);
        assert!(tok.tokens()[0].special);
        assert_eq!(tok.decode(&[true]), "");
    }
}
