// Review analysis pipeline:
// raw review -> clauses -> normalized clauses -> parse -> aspect pairs -> star rating.
// Clauses are independent, so extraction and scoring fan out with rayon; the
// indexed collect keeps results in input order.
use chrono::{Datelike, NaiveDate};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{parse_review_date, ReviewRecord};
use crate::error::Result;
use crate::nlp::aspects::{extract, ExtractionResult};
use crate::nlp::clauses::{split_clauses, MIN_CLAUSE_TOKENS};
use crate::nlp::lexicon::Lexicon;
use crate::nlp::parse::DependencyParser;
use crate::nlp::sentiment::{Sentiment, SentimentModel, StarRating};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewClause {
    pub raw_text: String,
    pub normalized_text: String,
    pub source_date: Option<NaiveDate>,
    pub source_review_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredClause {
    #[serde(flatten)]
    pub clause: ReviewClause,
    pub aspect: String,
    pub opinion: String,
    pub star_rating: StarRating,
    pub sentiment: Sentiment,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Split every review into kept clauses, carrying the review's date and index.
pub fn split_reviews(records: &[ReviewRecord], lexicon: &Lexicon, min_tokens: usize) -> Vec<ReviewClause> {
    let mut clauses = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let source_date = parse_review_date(&record.date);
        if source_date.is_none() && !record.date.trim().is_empty() {
            warn!(review = index, date = %record.date, "unparseable review date");
        }
        for clause in split_clauses(&record.review, lexicon, min_tokens) {
            clauses.push(ReviewClause {
                raw_text: clause.raw,
                normalized_text: clause.normalized,
                source_date,
                source_review_index: index,
            });
        }
    }
    clauses
}

pub struct Pipeline<'a> {
    lexicon: &'a Lexicon,
    parser: &'a dyn DependencyParser,
    model: &'a dyn SentimentModel,
    min_clause_tokens: usize,
    progress: Option<ProgressBar>,
}

impl<'a> Pipeline<'a> {
    pub fn new(lexicon: &'a Lexicon, parser: &'a dyn DependencyParser, model: &'a dyn SentimentModel) -> Self {
        Self {
            lexicon,
            parser,
            model,
            min_clause_tokens: MIN_CLAUSE_TOKENS,
            progress: None,
        }
    }

    pub fn with_min_clause_tokens(mut self, min_clause_tokens: usize) -> Self {
        self.min_clause_tokens = min_clause_tokens;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Extract pairs for one clause. A clause the parser cannot handle is
    /// treated as having no pairs, so it still reaches the report as neutral.
    pub fn extract_clause(&self, clause: &ReviewClause) -> ExtractionResult {
        if clause.normalized_text.is_empty() {
            return ExtractionResult::default();
        }
        match self.parser.parse(&clause.normalized_text) {
            Ok(parsed) => extract(&parsed),
            Err(e) => {
                debug!(error = %e, "no usable parse, clause reported as neutral");
                ExtractionResult::default()
            }
        }
    }

    fn score_clause(&self, clause: &ReviewClause) -> Result<Vec<ScoredClause>> {
        let pairs = self.extract_clause(clause);
        let star_rating = self.model.predict(&clause.normalized_text)?;
        let sentiment = star_rating.sentiment();
        let year = clause.source_date.map(|d| d.year());
        let month = clause.source_date.map(|d| d.month());

        let rows = pairs
            .labels()
            .into_iter()
            .map(|(aspect, opinion)| ScoredClause {
                clause: clause.clone(),
                aspect: aspect.to_string(),
                opinion: opinion.to_string(),
                star_rating,
                sentiment,
                year,
                month,
            })
            .collect();

        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
        Ok(rows)
    }

    /// Run the whole pipeline. Rows are ordered by review date (undated last),
    /// keeping clause order within a date.
    pub fn run(&self, records: &[ReviewRecord]) -> Result<Vec<ScoredClause>> {
        let clauses = split_reviews(records, self.lexicon, self.min_clause_tokens);
        if let Some(pb) = &self.progress {
            pb.set_length(clauses.len() as u64);
        }

        let per_clause: Vec<Vec<ScoredClause>> = clauses
            .par_iter()
            .map(|clause| self.score_clause(clause))
            .collect::<Result<_>>()?;

        let mut scored: Vec<ScoredClause> = per_clause.into_iter().flatten().collect();
        scored.sort_by_key(|s| (s.clause.source_date.is_none(), s.clause.source_date));

        if let Some(pb) = &self.progress {
            pb.finish_with_message("scored clauses");
        }
        info!(
            reviews = records.len(),
            clauses = clauses.len(),
            rows = scored.len(),
            "analysis complete"
        );
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::aspects::NEUTRAL;
    use crate::nlp::parse::{read_json_parses, ParseTable};
    use crate::nlp::sentiment::LexiconModel;

    const PARSES: &str = r#"[
        {"text": "really great battery backup", "tokens": [
            {"text": "really", "pos": "ADV", "tag": "RB", "dep": "advmod", "head": 1},
            {"text": "great", "pos": "ADJ", "tag": "JJ", "dep": "amod", "head": 3},
            {"text": "battery", "pos": "NOUN", "tag": "NN", "dep": "compound", "head": 3},
            {"text": "backup", "pos": "NOUN", "tag": "NN", "dep": "ROOT", "head": 3}
        ]},
        {"text": "screen not good", "tokens": [
            {"text": "screen", "pos": "NOUN", "tag": "NN", "dep": "nsubj", "head": 2},
            {"text": "not", "pos": "PART", "tag": "RB", "dep": "neg", "head": 2, "is_stop": true},
            {"text": "good", "pos": "ADJ", "tag": "JJ", "dep": "ROOT", "head": 2}
        ]}
    ]"#;

    fn records() -> Vec<ReviewRecord> {
        vec![
            ReviewRecord {
                date: "Reviewed in India on 12 March 2024".to_string(),
                review: "Really great battery backup. The screen is not good".to_string(),
            },
            ReviewRecord {
                date: "2023-01-05".to_string(),
                review: "Charging is very slow".to_string(),
            },
        ]
    }

    #[test]
    fn test_split_reviews_keeps_source() {
        let clauses = split_reviews(&records(), &Lexicon::english(), 3);
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[1].raw_text, "The screen is not good");
        assert_eq!(clauses[1].normalized_text, "screen not good");
        assert_eq!(clauses[1].source_review_index, 0);
        assert_eq!(clauses[2].source_review_index, 1);
        assert_eq!(clauses[2].source_date, NaiveDate::from_ymd_opt(2023, 1, 5));
    }

    #[test]
    fn test_run_end_to_end() -> Result<()> {
        let lexicon = Lexicon::english();
        let parses = ParseTable::from_clauses(read_json_parses(PARSES)?);
        let model = LexiconModel;
        let scored = Pipeline::new(&lexicon, &parses, &model).run(&records())?;

        let rows: Vec<(&str, &str, u8, Option<i32>)> = scored
            .iter()
            .map(|s| (s.aspect.as_str(), s.opinion.as_str(), s.star_rating.value(), s.year))
            .collect();
        assert_eq!(
            rows,
            vec![
                (NEUTRAL, NEUTRAL, 2, Some(2023)),
                ("backup", "really great", 5, Some(2024)),
                (NEUTRAL, NEUTRAL, 2, Some(2024)),
            ]
        );
        assert_eq!(scored[1].sentiment, Sentiment::Positive);
        assert_eq!(scored[1].month, Some(3));
        assert_eq!(scored[2].clause.raw_text, "The screen is not good");
        Ok(())
    }

    #[test]
    fn test_missing_parse_is_neutral_not_dropped() {
        let lexicon = Lexicon::english();
        let parses = ParseTable::new();
        let model = LexiconModel;
        let pipeline = Pipeline::new(&lexicon, &parses, &model);
        let clause = ReviewClause {
            raw_text: "Sound quality is amazing".to_string(),
            normalized_text: "sound quality amazing".to_string(),
            source_date: None,
            source_review_index: 0,
        };
        assert!(pipeline.extract_clause(&clause).is_empty());
        let rows = pipeline.score_clause(&clause).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].aspect, NEUTRAL);
    }

    #[test]
    fn test_malformed_parse_only_affects_its_clause() -> Result<()> {
        let dump = r#"[
            {"text": "really great battery backup", "tokens": [
                {"text": "really", "pos": "ADV", "dep": "advmod", "head": 1},
                {"text": "great", "pos": "ADJ", "dep": "amod", "head": 3},
                {"text": "battery", "pos": "NOUN", "dep": "compound", "head": 3},
                {"text": "backup", "pos": "NOUN", "dep": "ROOT", "head": 3}
            ]},
            {"text": "screen not good", "tokens": [
                {"text": "screen", "pos": "NOUN", "dep": "ROOT", "head": 0},
                {"text": "not", "pos": "PART", "dep": "neg", "head": 2},
                {"text": "good", "pos": "ADJ", "dep": "ROOT", "head": 2}
            ]}
        ]"#;
        let lexicon = Lexicon::english();
        let parses = ParseTable::from_clauses(read_json_parses(dump)?);
        let model = LexiconModel;
        let records = vec![ReviewRecord {
            date: "2024-05-01".to_string(),
            review: "Really great battery backup. The screen is not good".to_string(),
        }];
        let scored = Pipeline::new(&lexicon, &parses, &model).run(&records)?;

        let labels: Vec<(&str, &str)> = scored.iter().map(|s| (s.aspect.as_str(), s.opinion.as_str())).collect();
        assert_eq!(labels, vec![("backup", "really great"), (NEUTRAL, NEUTRAL)]);
        Ok(())
    }

    #[test]
    fn test_undated_rows_sort_last() -> Result<()> {
        let lexicon = Lexicon::english();
        let parses = ParseTable::new();
        let model = LexiconModel;
        let records = vec![
            ReviewRecord { date: String::new(), review: "the case feels cheap".to_string() },
            ReviewRecord { date: "2022-06-01".to_string(), review: "the strap broke quickly".to_string() },
        ];
        let scored = Pipeline::new(&lexicon, &parses, &model).run(&records)?;
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].clause.source_review_index, 1);
        assert_eq!(scored[1].year, None);
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        let lexicon = Lexicon::english();
        let parses = ParseTable::new();
        let model = LexiconModel;
        assert!(Pipeline::new(&lexicon, &parses, &model).run(&[])?.is_empty());
        Ok(())
    }
}
