// Noun lemmatizer using an exception table plus plural suffix rules.
// Mirrors dictionary-backed noun lemmatization closely enough for review text:
// irregular plurals come from the exception table, regular plurals are stripped
// by suffix, and known non-plural words ending in "s" are left alone.
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static IRREGULAR_NOUNS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("men", "man"), ("women", "woman"), ("children", "child"), ("feet", "foot"),
        ("teeth", "tooth"), ("mice", "mouse"), ("geese", "goose"), ("knives", "knife"),
        ("wives", "wife"), ("lives", "life"), ("leaves", "leaf"), ("halves", "half"),
        ("shelves", "shelf"), ("wolves", "wolf"), ("selves", "self"), ("loaves", "loaf"),
        ("thieves", "thief"), ("calves", "calf"), ("data", "datum"), ("media", "medium"),
        ("criteria", "criterion"), ("phenomena", "phenomenon"), ("indices", "index"),
        ("matrices", "matrix"), ("vertices", "vertex"), ("oxen", "ox"), ("dice", "die"),
        ("cacti", "cactus"), ("fungi", "fungus"), ("analyses", "analysis"),
        ("crises", "crisis"), ("theses", "thesis"), ("buses", "bus"), ("gases", "gas"),
        ("lenses", "lens"), ("boxes", "box"), ("taxes", "tax"), ("movies", "movie"),
        ("cookies", "cookie"), ("selfies", "selfie"), ("ties", "tie"), ("lies", "lie"),
        ("pies", "pie"), ("goes", "go"), ("heroes", "hero"), ("echoes", "echo"),
        ("potatoes", "potato"), ("tomatoes", "tomato"),
    ]
    .iter()
    .copied()
    .collect()
});

// Words ending in "s" that are not regular plurals.
static INVARIANT_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "always", "perhaps", "yes", "thus", "news", "series", "species", "lens", "ios",
        "os", "plus", "bonus", "status", "virus", "canvas", "gas", "bias", "alias", "chaos",
        "whereas", "towards", "afterwards", "besides", "sometimes", "nowadays", "overseas",
        "various", "bus", "atlas", "iris", "corpus", "genus", "campus", "focus", "minus",
        "nexus", "sinus", "walrus", "cosmos", "mathematics", "physics", "electronics",
        "economics",
    ]
    .iter()
    .copied()
    .collect()
});

#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<String, String>,
    invariant: HashSet<String>,
    enabled: bool,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::english()
    }
}

impl Lemmatizer {
    /// English noun lemmatizer with the built-in exception tables.
    pub fn english() -> Self {
        Self {
            exceptions: IRREGULAR_NOUNS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            invariant: INVARIANT_WORDS.iter().map(|w| w.to_string()).collect(),
            enabled: true,
        }
    }

    /// A lemmatizer that returns every word unchanged.
    #[cfg(test)]
    pub fn identity() -> Self {
        Self {
            exceptions: HashMap::new(),
            invariant: HashSet::new(),
            enabled: false,
        }
    }

    pub fn lemmatize(&self, word: &str) -> String {
        if !self.enabled {
            return word.to_string();
        }
        if let Some(lemma) = self.exceptions.get(word) {
            return lemma.clone();
        }
        if self.invariant.contains(word) || word.len() <= 3 {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{}y", stem);
            }
        }
        for suffix in ["sses", "ches", "shes", "xes", "zes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") || word.ends_with("ous") {
            return word.to_string();
        }
        match word.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => word.to_string(),
        }
    }
}
