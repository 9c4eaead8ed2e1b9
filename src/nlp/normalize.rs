// Text normalization for review clauses.
// lowercase -> contraction table -> letters only -> stopword removal -> lemmatize.
use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::Lexicon;

static NON_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z]").unwrap());

/// Normalize one clause. Empty or whitespace-only input yields an empty string.
///
/// Contractions are expanded by plain substring replacement, so "n't" also
/// matches inside unrelated words. That matches the reference cleaning step and
/// is intentionally not word-boundary aware.
pub fn normalize(raw: &str, lexicon: &Lexicon) -> String {
    let mut statement = raw.to_lowercase().trim().to_string();
    if statement.is_empty() {
        return statement;
    }

    for (from, to) in lexicon.contractions() {
        if statement.contains(from.as_str()) {
            statement = statement.replace(from.as_str(), to);
        }
    }

    let letters_only = NON_ALPHA.replace_all(&statement, " ");
    letters_only
        .split_whitespace()
        .filter(|word| !lexicon.is_stopword(word))
        .map(|word| lexicon.lemmatize(word))
        .collect::<Vec<_>>()
        .join(" ")
}
