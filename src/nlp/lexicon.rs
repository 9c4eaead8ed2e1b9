// Lexical resources used by the normalizer and clause splitter.
// A Lexicon is built once by the caller and passed by reference; nothing here is
// process-wide mutable state, so tests can swap in their own word lists.
use std::collections::HashSet;

use super::lemmatizer::Lemmatizer;

/// Stopwords that carry negation, contrast or degree and must survive cleaning.
pub const KEEP_WORDS: [&str; 19] = [
    "not", "but", "because", "against", "between", "up", "down", "in", "out", "once",
    "before", "after", "few", "more", "most", "no", "nor", "same", "some",
];

// NLTK English stopword list.
const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him",
    "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its",
    "itself", "they", "them", "their", "theirs", "themselves", "what", "which", "who",
    "whom", "this", "that", "that'll", "these", "those", "am", "is", "are", "was", "were",
    "be", "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing",
    "a", "an", "the", "and", "but", "if", "or", "because", "as", "until", "while", "of",
    "at", "by", "for", "with", "about", "against", "between", "into", "through", "during",
    "before", "after", "above", "below", "to", "from", "up", "down", "in", "out", "on",
    "off", "over", "under", "again", "further", "then", "once", "here", "there", "when",
    "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
    "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now", "d",
    "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't",
    "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven",
    "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn",
    "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren",
    "weren't", "won", "won't", "wouldn", "wouldn't",
];

// Applied in order as plain substring replacements. "n't" fires inside any word
// and shadows the later "doesn't" entry; both behaviours are kept as-is.
const CONTRACTIONS: &[(&str, &str)] = &[
    ("won't", "will not"),
    ("cannot", "can not"),
    ("can't", "can not"),
    ("n't", " not"),
    ("what's", "what is"),
    ("it's", "it is"),
    ("'ve", " have"),
    ("i'm", "i am"),
    ("'re", " are"),
    ("he's", "he is"),
    ("she's", "she is"),
    ("*****", " "),
    ("%", " percent "),
    ("₹", " rupee "),
    ("$", " dollar "),
    ("€", " euro "),
    ("'ll", " will"),
    ("doesn't", "does not"),
];

#[derive(Debug, Clone)]
pub struct Lexicon {
    stopwords: HashSet<String>,
    contractions: Vec<(String, String)>,
    lemmatizer: Lemmatizer,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::english()
    }
}

impl Lexicon {
    /// NLTK stopwords minus [`KEEP_WORDS`], the standard contraction table and the
    /// English noun lemmatizer.
    pub fn english() -> Self {
        Self::with_stopwords(ENGLISH_STOPWORDS.iter().copied(), Lemmatizer::english())
    }

    /// Build a lexicon from a custom stopword list. The keep-list is always
    /// removed from it.
    pub fn with_stopwords<I, S>(stopwords: I, lemmatizer: Lemmatizer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stopwords: HashSet<String> = stopwords
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        for word in KEEP_WORDS {
            stopwords.remove(word);
        }
        Self {
            stopwords,
            contractions: CONTRACTIONS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            lemmatizer,
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn contractions(&self) -> &[(String, String)] {
        &self.contractions
    }

    pub fn lemmatize(&self, word: &str) -> String {
        self.lemmatizer.lemmatize(word)
    }

    #[cfg(test)]
    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }
}
