//! Rule and lexicon driven Penn Treebank part-of-speech tagger.
//!
//! Tuned for short image captions. Closed-class words come from fixed tables,
//! common caption verbs and adjectives from word lists, and the rest from
//! suffix rules and a single left-context rule. Unknown words are nouns.

use super::lexicon::NounLexicon;

/// Penn Treebank tags produced by the tagger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    CC,
    CD,
    DT,
    EX,
    IN,
    JJ,
    MD,
    NN,
    NNS,
    NNP,
    NNPS,
    POS,
    PRP,
    PRPS,
    RB,
    RP,
    TO,
    UH,
    VB,
    VBD,
    VBG,
    VBN,
    VBP,
    VBZ,
    WDT,
    WP,
    WRB,
    Punct,
}

impl PosTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::CC => "CC",
            PosTag::CD => "CD",
            PosTag::DT => "DT",
            PosTag::EX => "EX",
            PosTag::IN => "IN",
            PosTag::JJ => "JJ",
            PosTag::MD => "MD",
            PosTag::NN => "NN",
            PosTag::NNS => "NNS",
            PosTag::NNP => "NNP",
            PosTag::NNPS => "NNPS",
            PosTag::POS => "POS",
            PosTag::PRP => "PRP",
            PosTag::PRPS => "PRP$",
            PosTag::RB => "RB",
            PosTag::RP => "RP",
            PosTag::TO => "TO",
            PosTag::UH => "UH",
            PosTag::VB => "VB",
            PosTag::VBD => "VBD",
            PosTag::VBG => "VBG",
            PosTag::VBN => "VBN",
            PosTag::VBP => "VBP",
            PosTag::VBZ => "VBZ",
            PosTag::WDT => "WDT",
            PosTag::WP => "WP",
            PosTag::WRB => "WRB",
            PosTag::Punct => ".",
        }
    }

    /// Tags starting with `N`.
    pub fn is_noun(&self) -> bool {
        self.as_str().starts_with('N')
    }

    /// Plural noun tags.
    pub fn is_plural_noun(&self) -> bool {
        matches!(self, PosTag::NNS | PosTag::NNPS)
    }

    /// Left contexts after which a verb-looking word reads as a noun.
    fn opens_noun_phrase(&self) -> bool {
        matches!(
            self,
            PosTag::DT | PosTag::JJ | PosTag::PRPS | PosTag::CD | PosTag::IN | PosTag::POS
        )
    }
}

impl std::fmt::Display for PosTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "some", "any", "each", "every", "no",
    "another", "both", "either", "neither", "all", "half",
];

const PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "of", "with", "by", "from", "into", "onto", "over", "under", "above",
    "below", "behind", "beside", "besides", "between", "near", "through", "across", "along",
    "around", "against", "among", "inside", "outside", "underneath", "beneath", "upon", "for",
    "about", "like", "during", "toward", "towards", "within", "without", "atop", "as", "than",
    "while", "because", "if", "whether", "after", "before", "since", "until", "via", "amid",
];

const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "plus", "&"];

const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "myself",
    "yourself", "himself", "herself", "itself", "ourselves", "themselves", "one", "mine",
    "yours", "hers", "ours", "theirs",
];

const POSSESSIVES: &[&str] = &["my", "your", "his", "her", "its", "our", "their"];

/// Indefinite pronouns, tagged as common nouns.
const INDEFINITE_NOUNS: &[&str] = &[
    "someone", "somebody", "something", "everyone", "everybody", "everything", "anyone",
    "anybody", "anything", "nobody", "nothing", "none",
];

const MODALS: &[&str] = &[
    "can", "could", "will", "would", "shall", "should", "may", "might", "must", "'ll", "'d",
];

const ADVERBS: &[&str] = &[
    "not", "n't", "very", "also", "just", "too", "quite", "here", "then", "now", "together",
    "almost", "slightly", "partially", "only", "still", "even", "rather", "really", "so",
    "nearby", "upside", "apart", "again", "somewhat", "there",
];

const PARTICLES: &[&str] = &["up", "down", "out", "off", "away", "back"];

const NUMBER_WORDS: &[&str] = &[
    "zero", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "dozen", "hundred", "thousand",
];

const ADJECTIVES: &[&str] = &[
    "red", "blue", "green", "yellow", "black", "white", "brown", "gray", "grey", "orange",
    "pink", "purple", "silver", "golden", "beige", "large", "small", "big", "little", "tall",
    "short", "long", "old", "new", "young", "open", "empty", "full", "wooden", "plastic",
    "dark", "bright", "clean", "dirty", "round", "many", "several", "few", "much", "other",
    "same", "different", "various", "multiple", "single", "tiny", "huge", "giant", "wide",
    "narrow", "thin", "thick", "flat", "sharp", "soft", "hard", "hot", "cold", "warm", "wet",
    "dry", "clear", "blurry", "messy", "cluttered", "shiny", "striped", "transparent", "metallic",
    "cute", "pretty", "close", "next", "first", "last", "top", "bottom", "left", "right",
    "front", "upper", "lower", "middle", "half-empty", "busy", "own", "such", "whole",
];

const WH_DETERMINERS: &[&str] = &["which", "whose", "whatever"];
const WH_PRONOUNS: &[&str] = &["who", "whom", "what"];
const WH_ADVERBS: &[&str] = &["where", "when", "why", "how"];

const INTERJECTIONS: &[&str] = &["oh", "yes", "hello", "wow"];

/// Forms of the auxiliaries `be`, `have` and `do`.
const AUXILIARIES: &[(&str, PosTag)] = &[
    ("is", PosTag::VBZ),
    ("are", PosTag::VBP),
    ("am", PosTag::VBP),
    ("'re", PosTag::VBP),
    ("'m", PosTag::VBP),
    ("was", PosTag::VBD),
    ("were", PosTag::VBD),
    ("be", PosTag::VB),
    ("been", PosTag::VBN),
    ("being", PosTag::VBG),
    ("has", PosTag::VBZ),
    ("have", PosTag::VBP),
    ("'ve", PosTag::VBP),
    ("had", PosTag::VBD),
    ("having", PosTag::VBG),
    ("does", PosTag::VBZ),
    ("do", PosTag::VBP),
    ("did", PosTag::VBD),
    ("doing", PosTag::VBG),
];

/// Base forms of verbs common in image captions.
const VERBS: &[&str] = &[
    "sit", "stand", "hold", "lie", "lay", "look", "walk", "run", "ride", "eat", "drink", "play",
    "wear", "carry", "use", "cut", "cook", "place", "put", "pick", "hang", "rest", "fill",
    "pour", "reach", "grab", "touch", "show", "watch", "read", "write", "work", "talk", "stare",
    "smile", "wait", "lean", "push", "pull", "point", "stir", "wash", "serve", "prepare",
    "sleep", "fly", "swim", "jump", "climb", "throw", "catch", "kick", "park", "drive", "cross",
    "face", "contain", "display", "feature", "sell", "dress", "cover", "stack", "pile", "take",
    "make", "see", "get", "give", "keep", "move", "turn", "try", "type", "open", "close",
    "lift", "grasp", "press", "slice", "chop", "peel", "mix", "fold", "wipe", "clean", "set",
    "sort", "arrange", "assemble", "attach", "insert", "remove", "operate", "manipulate",
    "grip", "pose", "appear", "seem", "seat", "perch", "float", "surround", "line", "overlook",
    "paint", "draw", "build", "fix", "repair", "store", "scatter", "spread", "hover",
];

/// Irregular inflections of the verbs above.
const IRREGULAR_VERBS: &[(&str, PosTag)] = &[
    ("sat", PosTag::VBD),
    ("stood", PosTag::VBD),
    ("held", PosTag::VBD),
    ("lying", PosTag::VBG),
    ("lain", PosTag::VBN),
    ("laid", PosTag::VBD),
    ("ran", PosTag::VBD),
    ("rode", PosTag::VBD),
    ("ridden", PosTag::VBN),
    ("ate", PosTag::VBD),
    ("eaten", PosTag::VBN),
    ("drank", PosTag::VBD),
    ("drunk", PosTag::VBN),
    ("wore", PosTag::VBD),
    ("worn", PosTag::VBN),
    ("hung", PosTag::VBD),
    ("took", PosTag::VBD),
    ("taken", PosTag::VBN),
    ("made", PosTag::VBD),
    ("seen", PosTag::VBN),
    ("saw", PosTag::VBD),
    ("shown", PosTag::VBN),
    ("got", PosTag::VBD),
    ("gotten", PosTag::VBN),
    ("gave", PosTag::VBD),
    ("given", PosTag::VBN),
    ("kept", PosTag::VBD),
    ("caught", PosTag::VBD),
    ("threw", PosTag::VBD),
    ("thrown", PosTag::VBN),
    ("flew", PosTag::VBD),
    ("flown", PosTag::VBN),
    ("swam", PosTag::VBD),
    ("climbed", PosTag::VBD),
    ("drove", PosTag::VBD),
    ("driven", PosTag::VBN),
    ("sold", PosTag::VBD),
    ("drew", PosTag::VBD),
    ("drawn", PosTag::VBN),
    ("built", PosTag::VBD),
    ("written", PosTag::VBN),
    ("wrote", PosTag::VBD),
];

/// Words ending in `-ing` that are nouns.
const ING_NOUNS: &[&str] = &[
    "thing", "string", "spring", "king", "ring", "wing", "sling", "swing", "ceiling",
    "building", "painting", "clothing", "railing", "awning", "wedding", "morning", "evening",
    "sibling", "pudding", "dumpling", "stuffing", "icing", "topping", "frosting", "seasoning",
    "dressing", "lighting", "flooring", "siding", "housing", "packaging", "wiring", "tubing",
    "bedding", "filling", "ping", "sing", "bling", "earring", "drawing", "opening", "carving",
];

/// Words ending in `-ed` that are nouns.
const ED_NOUNS: &[&str] = &[
    "bed", "shed", "sled", "seed", "weed", "feed", "reed", "speed", "breed", "steed", "need",
    "flatbed", "sunbed", "seabed", "hundred", "thread", "bread",
];

/// Words ending in `-ly` that are nouns.
const LY_NOUNS: &[&str] = &[
    "family", "fly", "lily", "belly", "jelly", "bully", "rally", "ally", "supply", "assembly",
    "butterfly", "dragonfly", "reply", "holly", "anomaly", "firefly", "housefly", "gully",
    "italy", "monopoly", "tally",
];

/// Words ending in `-ful` that are nouns.
const FUL_NOUNS: &[&str] = &["handful", "spoonful", "cupful", "mouthful", "armful", "bowlful"];

/// Words ending in `-able`/`-ible` that are nouns.
const ABLE_NOUNS: &[&str] = &[
    "table", "cable", "vegetable", "bible", "fable", "stable", "turntable", "timetable",
    "constable",
];

/// Words ending in `-ive` that are nouns.
const IVE_NOUNS: &[&str] = &[
    "olive", "drive", "hive", "chive", "archive", "detective", "knive", "beehive", "locomotive",
    "five", "adhesive", "explosive",
];

/// Words that look plural but are not.
const SINGULAR_S: &[&str] = &[
    "bus", "gas", "lens", "news", "series", "species", "canvas", "atlas", "chess",
];

/// Tag a tokenized caption.
pub struct PosTagger<'a> {
    lexicon: Option<&'a NounLexicon>,
}

impl<'a> PosTagger<'a> {
    pub fn new(lexicon: Option<&'a NounLexicon>) -> Self {
        Self { lexicon }
    }

    /// One tag per token.
    pub fn tag(&self, tokens: &[String]) -> Vec<PosTag> {
        let mut tags = Vec::with_capacity(tokens.len());
        let mut prev: Option<PosTag> = None;
        for (idx, token) in tokens.iter().enumerate() {
            let tag = self.tag_word(token, idx == 0, prev);
            tags.push(tag);
            prev = Some(tag);
        }
        tags
    }

    fn tag_word(&self, word: &str, sentence_start: bool, prev: Option<PosTag>) -> PosTag {
        if word.chars().all(|c| !c.is_alphanumeric()) {
            return PosTag::Punct;
        }
        if word.chars().any(|c| c.is_ascii_digit()) && !word.chars().any(|c| c.is_alphabetic()) {
            return PosTag::CD;
        }

        let lower = word.to_lowercase();
        let w = lower.as_str();

        if let Some(tag) = closed_class(w, prev) {
            return tag;
        }

        if !sentence_start && word.chars().next().is_some_and(char::is_uppercase) {
            return if is_plural_looking(w) {
                PosTag::NNPS
            } else {
                PosTag::NNP
            };
        }

        if ADJECTIVES.contains(&w) {
            return PosTag::JJ;
        }

        let after_noun_opener = prev.is_some_and(|p| p.opens_noun_phrase());

        if let Some(tag) = verb_form(w) {
            if tag == PosTag::VBG {
                let noun_context = matches!(
                    prev,
                    Some(PosTag::DT | PosTag::PRPS | PosTag::JJ | PosTag::CD | PosTag::POS)
                );
                return if noun_context { PosTag::NN } else { tag };
            }
            if after_noun_opener {
                return if tag == PosTag::VBZ {
                    PosTag::NNS
                } else if matches!(tag, PosTag::VBD | PosTag::VBN) && prev == Some(PosTag::DT) {
                    PosTag::JJ
                } else if matches!(tag, PosTag::VBD | PosTag::VBN) {
                    tag
                } else {
                    PosTag::NN
                };
            }
            if tag == PosTag::VB && prev.is_some_and(|p| p.is_noun()) {
                return if matches!(prev, Some(PosTag::NNS | PosTag::NNPS)) {
                    PosTag::VBP
                } else {
                    PosTag::NN
                };
            }
            if tag == PosTag::VB && !matches!(prev, Some(PosTag::TO | PosTag::MD) | None) {
                return PosTag::VBP;
            }
            return tag;
        }

        if let Some(tag) = self.suffix_rule(w, prev) {
            return tag;
        }

        if is_plural_looking(w) {
            PosTag::NNS
        } else {
            PosTag::NN
        }
    }

    fn suffix_rule(&self, w: &str, prev: Option<PosTag>) -> Option<PosTag> {
        let in_lexicon = self.lexicon.is_some_and(|lex| lex.contains(w));

        if w.ends_with("ing") && w.len() > 4 {
            let noun_context = matches!(
                prev,
                Some(PosTag::DT | PosTag::PRPS | PosTag::JJ | PosTag::CD | PosTag::POS)
            );
            return Some(if ING_NOUNS.contains(&w) || noun_context || in_lexicon {
                PosTag::NN
            } else {
                PosTag::VBG
            });
        }
        if w.ends_with("ings") && ING_NOUNS.contains(&&w[..w.len() - 1]) {
            return Some(PosTag::NNS);
        }
        if w.ends_with("ed") && w.len() > 3 {
            if ED_NOUNS.contains(&w) || in_lexicon {
                return Some(PosTag::NN);
            }
            return Some(if prev == Some(PosTag::DT) || prev == Some(PosTag::JJ) {
                PosTag::JJ
            } else {
                PosTag::VBN
            });
        }
        if w.ends_with("ly") && w.len() > 3 {
            return Some(if LY_NOUNS.contains(&w) || in_lexicon {
                PosTag::NN
            } else {
                PosTag::RB
            });
        }
        if w.ends_with("ous") && w.len() > 4 {
            return Some(PosTag::JJ);
        }
        if w.ends_with("ful") && w.len() > 4 {
            return Some(if FUL_NOUNS.contains(&w) {
                PosTag::NN
            } else {
                PosTag::JJ
            });
        }
        if (w.ends_with("able") || w.ends_with("ible")) && w.len() > 5 {
            return Some(if ABLE_NOUNS.contains(&w) || in_lexicon {
                PosTag::NN
            } else {
                PosTag::JJ
            });
        }
        if w.ends_with("ive") && w.len() > 4 {
            return Some(if IVE_NOUNS.contains(&w) || in_lexicon {
                PosTag::NN
            } else {
                PosTag::JJ
            });
        }
        None
    }
}

fn closed_class(w: &str, prev: Option<PosTag>) -> Option<PosTag> {
    if w == "'s" {
        return Some(if prev.is_some_and(|p| p.is_noun()) {
            PosTag::POS
        } else {
            PosTag::VBZ
        });
    }
    if w == "to" {
        return Some(PosTag::TO);
    }
    if w == "there" && prev.is_none() {
        return Some(PosTag::EX);
    }
    if INDEFINITE_NOUNS.contains(&w) {
        return Some(PosTag::NN);
    }
    if let Some(&(_, tag)) = AUXILIARIES.iter().find(|(form, _)| *form == w) {
        return Some(tag);
    }

    let tables: [(&[&str], PosTag); 13] = [
        (DETERMINERS, PosTag::DT),
        (PREPOSITIONS, PosTag::IN),
        (CONJUNCTIONS, PosTag::CC),
        (POSSESSIVES, PosTag::PRPS),
        (PRONOUNS, PosTag::PRP),
        (MODALS, PosTag::MD),
        (NUMBER_WORDS, PosTag::CD),
        (WH_DETERMINERS, PosTag::WDT),
        (WH_PRONOUNS, PosTag::WP),
        (WH_ADVERBS, PosTag::WRB),
        (INTERJECTIONS, PosTag::UH),
        (PARTICLES, PosTag::RP),
        (ADVERBS, PosTag::RB),
    ];
    tables
        .iter()
        .find(|(table, _)| table.contains(&w))
        .map(|&(_, tag)| tag)
}

/// Recognize an inflected or base form of a known verb.
fn verb_form(w: &str) -> Option<PosTag> {
    if let Some(&(_, tag)) = IRREGULAR_VERBS.iter().find(|(form, _)| *form == w) {
        return Some(tag);
    }
    if VERBS.contains(&w) {
        return Some(PosTag::VB);
    }
    if let Some(stem) = w.strip_suffix("ing") {
        if verb_stem(stem) {
            return Some(PosTag::VBG);
        }
    }
    if let Some(stem) = w.strip_suffix("ed") {
        if verb_stem(stem) {
            return Some(PosTag::VBD);
        }
    }
    if let Some(stem) = w.strip_suffix("ies") {
        if VERBS.contains(&format!("{stem}y").as_str()) {
            return Some(PosTag::VBZ);
        }
    }
    if let Some(stem) = w.strip_suffix("es") {
        if VERBS.contains(&stem) {
            return Some(PosTag::VBZ);
        }
    }
    if let Some(stem) = w.strip_suffix('s') {
        if VERBS.contains(&stem) {
            return Some(PosTag::VBZ);
        }
    }
    None
}

/// Whether an `-ing`/`-ed` stem belongs to a known verb.
fn verb_stem(stem: &str) -> bool {
    if stem.len() < 2 {
        return false;
    }
    if VERBS.contains(&stem) || VERBS.contains(&format!("{stem}e").as_str()) {
        return true;
    }
    // carried -> carri -> carry
    if let Some(stem) = stem.strip_suffix('i') {
        if VERBS.contains(&format!("{stem}y").as_str()) {
            return true;
        }
    }
    // sitting -> sitt -> sit
    let bytes = stem.as_bytes();
    let n = bytes.len();
    n >= 3 && bytes[n - 1] == bytes[n - 2] && VERBS.contains(&&stem[..n - 1])
}

fn is_plural_looking(w: &str) -> bool {
    w.len() > 3
        && w.ends_with('s')
        && !SINGULAR_S.contains(&w)
        && !w.ends_with("ss")
        && !w.ends_with("us")
        && !w.ends_with("is")
}

#[cfg(test)]
mod tests {
    use super::super::tokenize::tokenize;
    use super::*;

    fn tags(text: &str) -> Vec<(String, &'static str)> {
        let tokens = tokenize(text);
        let tags = PosTagger::new(None).tag(&tokens);
        tokens
            .into_iter()
            .zip(tags.into_iter().map(|t| t.as_str()))
            .collect()
    }

    fn nouns(text: &str) -> Vec<String> {
        tags(text)
            .into_iter()
            .filter(|(_, t)| t.starts_with('N'))
            .map(|(w, _)| w)
            .collect()
    }

    #[test]
    fn test_simple_caption() {
        assert_eq!(
            tags("a cat sits on a table"),
            vec![
                ("a".to_string(), "DT"),
                ("cat".to_string(), "NN"),
                ("sits".to_string(), "VBZ"),
                ("on".to_string(), "IN"),
                ("a".to_string(), "DT"),
                ("table".to_string(), "NN"),
            ]
        );
    }

    #[test]
    fn test_progressive_verb() {
        assert_eq!(
            nouns("two men holding coffee cups at a wooden desk"),
            vec!["men", "coffee", "cups", "desk"]
        );
    }

    #[test]
    fn test_verb_after_determiner_is_noun() {
        assert_eq!(nouns("a robot arm picks up the cut"), vec!["robot", "arm", "cut"]);
        assert_eq!(nouns("an open display of plates"), vec!["display", "plates"]);
    }

    #[test]
    fn test_gerund_after_determiner_is_noun() {
        assert_eq!(nouns("the building has a ceiling"), vec!["building", "ceiling"]);
    }

    #[test]
    fn test_possessive() {
        let tagged = tags("a person's hand");
        assert_eq!(tagged[2].1, "POS");
        assert_eq!(nouns("a person's hand"), vec!["person", "hand"]);
    }

    #[test]
    fn test_indefinite_pronoun_is_noun() {
        assert_eq!(nouns("someone is cooking in a kitchen"), vec!["someone", "kitchen"]);
    }

    #[test]
    fn test_adjectives_and_adverbs() {
        assert_eq!(
            nouns("a very colorful plate with slightly burned toast"),
            vec!["plate", "toast"]
        );
    }

    #[test]
    fn test_proper_noun_mid_sentence() {
        let tagged = tags("a can of Coke");
        assert_eq!(tagged[3].1, "NNP");
    }

    #[test]
    fn test_numbers() {
        let tagged = tags("3 apples");
        assert_eq!(tagged[0].1, "CD");
        assert_eq!(tagged[1].1, "NNS");
    }

    #[test]
    fn test_no_nouns() {
        assert!(nouns("it is very bright.").is_empty());
    }
}
