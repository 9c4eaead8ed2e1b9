// Aggregation of scored clauses into chart-ready data: per-aspect mean scores
// (bar), sentiment shares (pie), score timeline (line) and opinion
// frequencies (word cloud).
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::nlp::aspects::NEUTRAL;
use crate::nlp::sentiment::Sentiment;
use crate::pipeline::ScoredClause;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frequency {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_clauses: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub unique_aspects: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectScore {
    pub aspect: String,
    pub mean_score: f64,
    pub mentions: usize,
}

/// Percentages of each sentiment, each rounded half-to-even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SentimentShare {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectReport {
    pub aspect: String,
    pub clauses: usize,
    pub share: SentimentShare,
    pub timeline: Vec<TimelinePoint>,
    pub word_cloud: Vec<Frequency>,
    pub positive_samples: Vec<String>,
    pub negative_samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub aspect_scores: Vec<AspectScore>,
    pub aspects: Vec<AspectReport>,
}

pub fn summarize(rows: &[ScoredClause]) -> Summary {
    let count = |s: Sentiment| rows.iter().filter(|r| r.sentiment == s).count();
    let unique: BTreeSet<&str> = rows.iter().map(|r| r.aspect.as_str()).collect();
    Summary {
        total_clauses: rows.len(),
        positive: count(Sentiment::Positive),
        negative: count(Sentiment::Negative),
        neutral: count(Sentiment::Neutral),
        unique_aspects: unique.len(),
    }
}

// Most frequent first, ties alphabetical.
fn ranked<'r>(terms: impl Iterator<Item = &'r str>) -> Vec<Frequency> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for term in terms {
        *counts.entry(term).or_insert(0) += 1;
    }
    let mut ranked: Vec<Frequency> = counts
        .into_iter()
        .map(|(term, count)| Frequency { term: term.to_string(), count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    ranked
}

/// The `limit` most mentioned aspects, excluding the neutral placeholder.
pub fn top_aspects(rows: &[ScoredClause], limit: usize) -> Vec<String> {
    ranked(rows.iter().map(|r| r.aspect.as_str()))
        .into_iter()
        .filter(|f| f.term != NEUTRAL)
        .take(limit)
        .map(|f| f.term)
        .collect()
}

/// Mean star rating of the rows extracted for each aspect.
pub fn aspect_scores(rows: &[ScoredClause], aspects: &[String]) -> Vec<AspectScore> {
    aspects
        .iter()
        .map(|aspect| {
            let scores: Vec<f64> = rows
                .iter()
                .filter(|r| &r.aspect == aspect)
                .map(|r| f64::from(r.star_rating.value()))
                .collect();
            let mean_score = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            AspectScore {
                aspect: aspect.clone(),
                mean_score,
                mentions: scores.len(),
            }
        })
        .collect()
}

/// Rows whose normalized clause mentions `aspect` anywhere in its text.
pub fn rows_for_aspect<'r>(rows: &'r [ScoredClause], aspect: &str) -> Vec<&'r ScoredClause> {
    rows.iter()
        .filter(|r| r.clause.normalized_text.contains(aspect))
        .collect()
}

pub fn sentiment_share(rows: &[&ScoredClause]) -> SentimentShare {
    if rows.is_empty() {
        return SentimentShare::default();
    }
    let total = rows.len() as f64;
    let percent = |s: Sentiment| {
        let n = rows.iter().filter(|r| r.sentiment == s).count() as f64;
        (n * 100.0 / total).round_ties_even() as u32
    };
    SentimentShare {
        positive: percent(Sentiment::Positive),
        negative: percent(Sentiment::Negative),
        neutral: percent(Sentiment::Neutral),
    }
}

/// Dated (date, score) points in date order.
pub fn timeline(rows: &[&ScoredClause]) -> Vec<TimelinePoint> {
    let mut points: Vec<TimelinePoint> = rows
        .iter()
        .filter_map(|r| {
            r.clause.source_date.map(|date| TimelinePoint {
                date,
                score: r.star_rating.value(),
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// Opinion frequencies for a word cloud.
pub fn word_cloud(rows: &[&ScoredClause]) -> Vec<Frequency> {
    ranked(rows.iter().map(|r| r.opinion.as_str()))
}

/// Up to `limit` distinct raw clauses with the given sentiment, in row order.
pub fn samples(rows: &[&ScoredClause], sentiment: Sentiment, limit: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for row in rows.iter().filter(|r| r.sentiment == sentiment) {
        if out.len() == limit {
            break;
        }
        if seen.insert(row.clause.raw_text.as_str()) {
            out.push(row.clause.raw_text.clone());
        }
    }
    out
}

pub fn aspect_report(rows: &[ScoredClause], aspect: &str, sample_limit: usize) -> AspectReport {
    let selected = rows_for_aspect(rows, aspect);
    AspectReport {
        aspect: aspect.to_string(),
        clauses: selected.len(),
        share: sentiment_share(&selected),
        timeline: timeline(&selected),
        word_cloud: word_cloud(&selected),
        positive_samples: samples(&selected, Sentiment::Positive, sample_limit),
        negative_samples: samples(&selected, Sentiment::Negative, sample_limit),
    }
}

/// Build the full report. With `only`, a single aspect is detailed instead of
/// every top aspect.
pub fn build_report(rows: &[ScoredClause], config: &AnalysisConfig, only: Option<&str>) -> Report {
    let top = top_aspects(rows, config.top_aspects);
    let detailed: Vec<String> = match only {
        Some(aspect) => vec![aspect.to_string()],
        None => top.clone(),
    };
    Report {
        summary: summarize(rows),
        aspect_scores: aspect_scores(rows, &top),
        aspects: detailed
            .iter()
            .map(|aspect| aspect_report(rows, aspect, config.samples_per_sentiment))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::sentiment::StarRating;
    use crate::pipeline::ReviewClause;

    fn row(
        raw: &str,
        normalized: &str,
        aspect: &str,
        opinion: &str,
        stars: u8,
        date: Option<(i32, u32, u32)>,
    ) -> ScoredClause {
        let star_rating = StarRating::new(stars).unwrap();
        let source_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        ScoredClause {
            clause: ReviewClause {
                raw_text: raw.to_string(),
                normalized_text: normalized.to_string(),
                source_date,
                source_review_index: 0,
            },
            aspect: aspect.to_string(),
            opinion: opinion.to_string(),
            star_rating,
            sentiment: star_rating.sentiment(),
            year: None,
            month: None,
        }
    }

    fn fixture() -> Vec<ScoredClause> {
        vec![
            row("Battery is great", "battery great", "battery", "great", 5, Some((2024, 3, 2))),
            row("Battery drains fast", "battery drain fast", "battery", "fast", 2, Some((2024, 1, 9))),
            row("Battery drains fast", "battery drain fast", "battery", "fast", 2, Some((2024, 1, 9))),
            row("Screen is bright", "screen bright", "screen", "bright", 4, Some((2024, 2, 1))),
            row("Arrived on time", "arrived time", NEUTRAL, NEUTRAL, 3, None),
            row("Sound okay", "sound okay", NEUTRAL, NEUTRAL, 3, None),
            row("Sound okay", "sound okay", "sound", "okay", 3, None),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let summary = summarize(&fixture());
        assert_eq!(summary.total_clauses, 7);
        assert_eq!(summary.positive, 2);
        assert_eq!(summary.negative, 2);
        assert_eq!(summary.neutral, 3);
        assert_eq!(summary.unique_aspects, 4);
    }

    #[test]
    fn test_top_aspects_exclude_neutral() {
        assert_eq!(top_aspects(&fixture(), 14), vec!["battery", "screen", "sound"]);
        assert_eq!(top_aspects(&fixture(), 1), vec!["battery"]);
    }

    #[test]
    fn test_aspect_mean_scores() {
        let rows = fixture();
        let scores = aspect_scores(&rows, &["battery".to_string(), "missing".to_string()]);
        assert_eq!(scores[0].mentions, 3);
        assert!((scores[0].mean_score - 3.0).abs() < 1e-9);
        assert_eq!(scores[1].mentions, 0);
        assert_eq!(scores[1].mean_score, 0.0);
    }

    #[test]
    fn test_rows_for_aspect_uses_substring() {
        let rows = fixture();
        assert_eq!(rows_for_aspect(&rows, "battery").len(), 3);
        assert_eq!(rows_for_aspect(&rows, "sound").len(), 2);
    }

    #[test]
    fn test_sentiment_share_rounds_half_to_even() {
        let rows = vec![
            row("a", "a", "x", "y", 5, None),
            row("b", "b", "x", "y", 1, None),
            row("c", "c", "x", "y", 1, None),
            row("d", "d", "x", "y", 1, None),
            row("e", "e", "x", "y", 1, None),
            row("f", "f", "x", "y", 1, None),
            row("g", "g", "x", "y", 1, None),
            row("h", "h", "x", "y", 3, None),
        ];
        let refs: Vec<&ScoredClause> = rows.iter().collect();
        // 12.5 -> 12, 75 -> 75, 12.5 -> 12
        assert_eq!(
            sentiment_share(&refs),
            SentimentShare { positive: 12, negative: 75, neutral: 12 }
        );
        assert_eq!(sentiment_share(&[]), SentimentShare::default());
    }

    #[test]
    fn test_timeline_sorted_and_dated_only() {
        let rows = fixture();
        let refs: Vec<&ScoredClause> = rows.iter().collect();
        let points = timeline(&refs);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(points[3].score, 5);
    }

    #[test]
    fn test_word_cloud_frequencies() {
        let rows = fixture();
        let selected = rows_for_aspect(&rows, "battery");
        let cloud = word_cloud(&selected);
        assert_eq!(cloud[0], Frequency { term: "fast".to_string(), count: 2 });
        assert_eq!(cloud[1], Frequency { term: "great".to_string(), count: 1 });
    }

    #[test]
    fn test_samples_are_distinct_and_limited() {
        let rows = fixture();
        let refs: Vec<&ScoredClause> = rows.iter().collect();
        assert_eq!(samples(&refs, Sentiment::Negative, 15), vec!["Battery drains fast"]);
        assert_eq!(samples(&refs, Sentiment::Neutral, 1), vec!["Arrived on time"]);
    }

    #[test]
    fn test_build_report_single_aspect() {
        let rows = fixture();
        let report = build_report(&rows, &AnalysisConfig::default(), Some("screen"));
        assert_eq!(report.aspect_scores.len(), 3);
        assert_eq!(report.aspects.len(), 1);
        assert_eq!(report.aspects[0].clauses, 1);
        assert_eq!(report.aspects[0].share.positive, 100);
        assert_eq!(report.aspects[0].positive_samples, vec!["Screen is bright"]);
    }

    #[test]
    fn test_build_report_serializes() {
        let rows = fixture();
        let report = build_report(&rows, &AnalysisConfig::default(), None);
        assert_eq!(report.aspects.len(), 3);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"aspect\":\"battery\""));
    }
}
