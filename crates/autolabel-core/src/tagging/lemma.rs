//! WordNet-style noun lemmatization.
//!
//! Irregular plurals come from an exception table. Regular plurals go through
//! the WordNet noun detachment rules; with a lexicon loaded the candidates are
//! validated against it and the shortest known form wins, otherwise guarded
//! heuristics pick one.

use super::lexicon::NounLexicon;

/// Irregular noun plurals.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("shelves", "shelf"),
    ("halves", "half"),
    ("wolves", "wolf"),
    ("calves", "calf"),
    ("scarves", "scarf"),
    ("thieves", "thief"),
    ("selves", "self"),
    ("data", "datum"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("cacti", "cactus"),
    ("fungi", "fungus"),
    ("tomatoes", "tomato"),
    ("potatoes", "potato"),
    ("heroes", "hero"),
    ("mangoes", "mango"),
    ("volcanoes", "volcano"),
    ("dominoes", "domino"),
];

/// WordNet noun detachment rules, in WordNet's order.
const RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// Nouns whose singular ends in `-ie`.
const IE_NOUNS: &[&str] = &[
    "cookie", "movie", "pie", "tie", "lie", "brownie", "selfie", "zombie", "calorie",
    "smoothie", "goalie", "rookie", "veggie", "collie", "hoodie", "beanie", "birdie", "genie",
];

/// Plural-looking nouns WordNet keeps as they are.
const PLURAL_ONLY: &[&str] = &["scissors", "clothes", "news", "series"];

/// Lemmatize one noun.
///
/// `plural` is the tagger's verdict; without a lexicon only plural-tagged
/// words are reduced. The result is lower-cased.
pub fn lemmatize(word: &str, plural: bool, lexicon: Option<&NounLexicon>) -> String {
    let lower = word.to_lowercase();

    if let Some(&(_, lemma)) = EXCEPTIONS.iter().find(|(form, _)| *form == lower) {
        return lemma.to_string();
    }

    match lexicon.filter(|lex| !lex.is_empty()) {
        Some(lexicon) => validated(&lower, lexicon),
        None if plural => heuristic(&lower),
        None => lower,
    }
}

/// Shortest lexicon-known candidate among the word and its detachments.
fn validated(word: &str, lexicon: &NounLexicon) -> String {
    let mut candidates = vec![word.to_string()];
    for (suffix, replacement) in RULES {
        if let Some(stem) = word.strip_suffix(suffix) {
            if !stem.is_empty() {
                candidates.push(format!("{stem}{replacement}"));
            }
        }
    }

    candidates
        .into_iter()
        .filter(|c| lexicon.contains(c))
        .min_by_key(|c| c.len())
        .unwrap_or_else(|| word.to_string())
}

fn heuristic(word: &str) -> String {
    if word.len() <= 3
        || PLURAL_ONLY.contains(&word)
        || word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is")
    {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if word.len() > 4 {
            let ie = format!("{stem}ie");
            return if IE_NOUNS.contains(&ie.as_str()) {
                ie
            } else {
                format!("{stem}y")
            };
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        // glasses -> glass, buses -> bus, but houses -> house
        let us_stem = stem.ends_with("us") && !stem.ends_with("ous");
        if stem.ends_with("ss") || us_stem || stem.ends_with("zz") {
            return stem.to_string();
        }
        if stem.ends_with('x') || stem.ends_with("ch") || stem.ends_with("sh") {
            return stem.to_string();
        }
    }
    for ending in ["emen", "smen", "rmen"] {
        if word.ends_with(ending) {
            return format!("{}man", &word[..word.len() - 3]);
        }
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}
