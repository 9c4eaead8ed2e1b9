// NLP module for reviewlens
pub mod aspects;
pub mod clauses;
pub mod lemmatizer;
pub mod lexicon;
pub mod normalize;
pub mod parse;
pub mod sentiment;

pub use aspects::extract;
pub use clauses::split_clauses;
pub use lexicon::Lexicon;
pub use parse::ParseTable;
pub use sentiment::{CommandModel, LexiconModel, SentimentModel};
