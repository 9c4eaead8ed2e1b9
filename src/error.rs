// Error types shared by the analysis modules.
// The binary wraps these in anyhow; library code returns them directly.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed parse for clause {clause:?}: {message}")]
    MalformedParse { clause: String, message: String },

    #[error("CoNLL-U line {line}: {message}")]
    Conllu { line: usize, message: String },

    #[error("no parse available for clause {0:?}")]
    MissingParse(String),

    #[error("no review column in {path}; available columns: {columns:?}")]
    MissingColumn { path: PathBuf, columns: Vec<String> },

    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("invalid star label {0:?}")]
    InvalidStarLabel(String),

    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
