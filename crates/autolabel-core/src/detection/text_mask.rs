//! Sub-sentence text masks for the detector's text encoder.
//!
//! Each phrase of the prompt (delimited by `[CLS]`, `[SEP]`, `.` or `?`)
//! only attends to itself, and position ids restart at every phrase.

/// Fallback BERT ids for `[CLS]`, `[SEP]`, `.` and `?`.
const DEFAULT_SPECIAL_IDS: [i64; 4] = [101, 102, 1012, 1029];

/// Token ids that delimit sub-sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTokenIds {
    ids: Vec<i64>,
}

impl SpecialTokenIds {
    /// Look the delimiters up in a tokenizer vocabulary.
    pub fn from_tokenizer(tokenizer: &tokenizers::Tokenizer) -> Self {
        let ids = ["[CLS]", "[SEP]", ".", "?"]
            .iter()
            .zip(DEFAULT_SPECIAL_IDS)
            .map(|(token, fallback)| {
                tokenizer
                    .token_to_id(token)
                    .map(i64::from)
                    .unwrap_or(fallback)
            })
            .collect();
        Self { ids }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }
}

impl Default for SpecialTokenIds {
    fn default() -> Self {
        Self {
            ids: DEFAULT_SPECIAL_IDS.to_vec(),
        }
    }
}

/// Flattened `[len, len]` attention mask plus per-token position ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMasks {
    pub len: usize,
    pub attention: Vec<bool>,
    pub position_ids: Vec<i64>,
}

impl TextMasks {
    pub fn attends(&self, row: usize, col: usize) -> bool {
        self.attention[row * self.len + col]
    }
}

/// Build block-diagonal attention and restarting position ids for `input_ids`.
pub fn sub_sentence_masks(input_ids: &[i64], special: &SpecialTokenIds) -> TextMasks {
    let len = input_ids.len();
    let mut attention = vec![false; len * len];
    let mut position_ids = vec![0i64; len];
    for i in 0..len {
        attention[i * len + i] = true;
    }

    let mut previous = 0usize;
    for (col, &id) in input_ids.iter().enumerate() {
        if !special.contains(id) {
            continue;
        }
        if col == 0 || col + 1 == len {
            position_ids[col] = 0;
        } else {
            for row in previous + 1..=col {
                for c in previous + 1..=col {
                    attention[row * len + c] = true;
                }
                position_ids[row] = (row - previous - 1) as i64;
            }
        }
        previous = col;
    }

    TextMasks {
        len,
        attention,
        position_ids,
    }
}
