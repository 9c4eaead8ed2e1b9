// Analysis settings: JSON file with every field optional, plus an environment
// override for the external classifier command.
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};
use crate::nlp::clauses::MIN_CLAUSE_TOKENS;

pub const CLASSIFIER_ENV: &str = "REVIEWLENS_CLASSIFIER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_clause_tokens: usize,
    pub top_aspects: usize,
    pub samples_per_sentiment: usize,
    /// argv of an external star-rating classifier; the lexicon scorer is used
    /// when unset.
    pub classifier_command: Option<Vec<String>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_clause_tokens: MIN_CLAUSE_TOKENS,
            top_aspects: 14,
            samples_per_sentiment: 15,
            classifier_command: None,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `REVIEWLENS_CLASSIFIER` (whitespace separated argv) if it is set.
    pub fn with_env(self) -> Self {
        self.with_classifier_override(std::env::var(CLASSIFIER_ENV).ok().as_deref())
    }

    fn with_classifier_override(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            let argv: Vec<String> = value.split_whitespace().map(String::from).collect();
            if !argv.is_empty() {
                self.classifier_command = Some(argv);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_aspects == 0 {
            return Err(ReviewError::Config("top_aspects must be at least 1".to_string()));
        }
        if matches!(&self.classifier_command, Some(argv) if argv.is_empty()) {
            return Err(ReviewError::Config("classifier_command is empty".to_string()));
        }
        Ok(())
    }
}
