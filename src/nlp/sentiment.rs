// Sentiment scoring: a 1-5 star rating per clause.
// LexiconModel is a lightweight word-list scorer that works offline. CommandModel
// shells out to an external classifier (e.g. a transformer wrapped in a script)
// and falls back to the lexicon when the process cannot be run.
use std::collections::HashSet;
use std::fmt;
use std::process::Command;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ReviewError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StarRating(u8);

impl StarRating {
    pub fn new(stars: u8) -> Option<Self> {
        (1..=5).contains(&stars).then_some(Self(stars))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn sentiment(self) -> Sentiment {
        match self.0 {
            1 | 2 => Sentiment::Negative,
            3 => Sentiment::Neutral,
            _ => Sentiment::Positive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A text -> star rating classifier. Implementations must be shareable across
/// worker threads.
pub trait SentimentModel: Send + Sync {
    fn predict(&self, text: &str) -> Result<StarRating>;
}

/// Parse classifier labels such as `"4 stars"` or `"1 star"`.
pub fn parse_star_label(label: &str) -> Result<StarRating> {
    label
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<u8>().ok())
        .and_then(StarRating::new)
        .ok_or_else(|| ReviewError::InvalidStarLabel(label.to_string()))
}

// Positive words lexicon
static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "good", "great", "excellent", "wonderful", "fantastic", "amazing", "awesome",
        "love", "happy", "joy", "pleased", "delighted", "satisfied", "perfect",
        "beautiful", "brilliant", "outstanding", "superb", "magnificent", "marvelous",
        "terrific", "fabulous", "exceptional", "impressive", "remarkable", "best",
        "better", "positive", "advantage", "benefit", "success", "successful",
        "enjoy", "pleasant", "comfortable", "excited", "exciting", "thrilled",
        "like", "liked", "favorite", "prefer", "nice", "fast", "smooth", "clear",
        "crisp", "bright", "loud", "solid", "sturdy", "recommend", "worth", "value",
        "premium", "reliable", "durable", "decent", "ok", "okay", "fine", "gorgeous",
        "lightweight", "responsive", "easy", "cheap", "affordable", "super",
    ]
    .iter()
    .copied()
    .collect()
});

// Negative words lexicon
static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bad", "terrible", "awful", "horrible", "poor", "worst", "worse",
        "hate", "angry", "sad", "upset", "disappointed", "dissatisfied", "unhappy",
        "fail", "failure", "failed", "problem", "issue", "wrong", "error",
        "difficult", "hard", "broken", "damage", "damaged", "disaster", "negative",
        "waste", "reject", "returned", "return", "refund", "dislike", "unpleasant",
        "uncomfortable", "disappointing", "frustrating", "slow", "lag", "laggy",
        "heat", "heating", "overheat", "garbage", "junk", "useless", "defective",
        "faulty", "noisy", "dead", "drain", "weak", "fake", "cheaply", "flimsy",
        "expensive", "overpriced", "scratch", "crack", "cracked", "stopped",
    ]
    .iter()
    .copied()
    .collect()
});

// Intensifiers
static INTENSIFIERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["very", "extremely", "absolutely", "really", "incredibly", "highly", "totally", "most", "super"]
        .iter().copied().collect()
});

// Negation words
static NEGATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["not", "no", "never", "nothing", "nobody", "nowhere", "neither", "nor", "none"]
        .iter().copied().collect()
});

/// Word-list scorer with intensifier and negation handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconModel;

impl LexiconModel {
    /// Weighted (positive, negative) hit totals for a text.
    pub fn scores(&self, text: &str) -> (f32, f32) {
        let words: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let mut positive_score = 0.0;
        let mut negative_score = 0.0;

        for (i, word) in words.iter().enumerate() {
            let multiplier = if i > 0 && INTENSIFIERS.contains(words[i - 1].as_str()) {
                1.5
            } else {
                1.0
            };

            // Check for negation in previous 1-2 words
            let is_negated = (i > 0 && NEGATIONS.contains(words[i - 1].as_str()))
                || (i > 1 && NEGATIONS.contains(words[i - 2].as_str()));

            let positive = POSITIVE_WORDS.contains(word.as_str());
            let negative = NEGATIVE_WORDS.contains(word.as_str());
            match (positive, negative, is_negated) {
                (true, _, false) | (false, true, true) => positive_score += multiplier,
                (true, _, true) | (false, true, false) => negative_score += multiplier,
                _ => {}
            }
        }

        (positive_score, negative_score)
    }

    fn stars(&self, text: &str) -> StarRating {
        let (positive, negative) = self.scores(text);
        let total = positive + negative;
        if total == 0.0 {
            return StarRating(3);
        }
        let polarity = (positive - negative) / total;
        let stars = if polarity > 0.2 {
            if polarity >= 0.6 && total >= 1.5 { 5 } else { 4 }
        } else if polarity < -0.2 {
            if polarity <= -0.6 && total >= 1.5 { 1 } else { 2 }
        } else {
            3
        };
        StarRating(stars)
    }
}

impl SentimentModel for LexiconModel {
    fn predict(&self, text: &str) -> Result<StarRating> {
        Ok(self.stars(text))
    }
}

/// Runs `program args... <text>` and reads a star label from the first
/// non-empty line of stdout.
#[derive(Debug, Clone)]
pub struct CommandModel {
    program: String,
    args: Vec<String>,
    fallback: LexiconModel,
}

impl CommandModel {
    pub fn new(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ReviewError::Config("classifier command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            fallback: LexiconModel,
        })
    }

    fn run(&self, text: &str) -> Result<StarRating> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .output()
            .map_err(|e| ReviewError::Classifier(format!("failed to invoke {}: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(ReviewError::Classifier(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let label = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
        parse_star_label(label)
    }
}

impl SentimentModel for CommandModel {
    fn predict(&self, text: &str) -> Result<StarRating> {
        match self.run(text) {
            Ok(stars) => Ok(stars),
            Err(e) => {
                warn!(error = %e, "classifier failed, using lexicon scorer");
                self.fallback.predict(text)
            }
        }
    }
}
