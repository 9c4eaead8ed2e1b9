// Clause splitting on sentence ends and the conjunctions "but", "and", "also".
use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::Lexicon;
use super::normalize::normalize;

/// Fragments shorter than this many whitespace tokens are dropped.
pub const MIN_CLAUSE_TOKENS: usize = 3;

// Delimiters are matched as raw substrings, so "understand" splits at "and".
static CLAUSE_DELIMITERS: Lazy<Regex> = Lazy::new(|| {
    let alternation = [".", "but", "and", "also"]
        .iter()
        .map(|d| regex::escape(d))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).unwrap()
});

/// A kept fragment and its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// The fragment with surrounding whitespace trimmed.
    pub raw: String,
    pub normalized: String,
}

/// Split a review into fragments, keeping those with at least `min_tokens`
/// whitespace tokens. Short fragments are discarded, never merged.
pub fn split_review_with(raw_review: &str, min_tokens: usize) -> Vec<String> {
    CLAUSE_DELIMITERS
        .split(raw_review)
        .filter(|fragment| fragment.split_whitespace().count() >= min_tokens)
        .map(|fragment| fragment.trim().to_string())
        .collect()
}

/// Split and normalize, pairing each raw fragment with its cleaned text.
pub fn split_clauses(raw_review: &str, lexicon: &Lexicon, min_tokens: usize) -> Vec<Clause> {
    split_review_with(raw_review, min_tokens)
        .into_iter()
        .map(|raw| {
            let normalized = normalize(&raw, lexicon);
            Clause { raw, normalized }
        })
        .collect()
}
