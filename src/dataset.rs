// Review datasets: loading CSV/JSON exports, batch cleaning, and writing scored
// clauses back out as CSV.
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, ReviewError};
use crate::nlp::lexicon::Lexicon;
use crate::nlp::normalize::normalize;
use crate::pipeline::ScoredClause;

/// Header names recognised as the review text column, first match wins.
pub const REVIEW_COLUMNS: [&str; 6] = ["review_text", "review", "text", "Review", "Review_Text", "reviews"];
pub const DATE_COLUMNS: [&str; 2] = ["Date", "date"];

const DATE_FORMATS: [&str; 6] = ["%d %B %Y", "%B %d, %Y", "%B %d %Y", "%d %b %Y", "%b %d, %Y", "%Y-%m-%d"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(default)]
    pub date: String,
    pub review: String,
}

/// Parse a review date. Scraped dates such as "Reviewed in India on 12 March
/// 2024" are reduced to their last three words first.
pub fn parse_review_date(raw: &str) -> Option<NaiveDate> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    let tail = words[words.len().saturating_sub(3)..].join(" ");
    [tail.as_str(), raw.trim()].iter().find_map(|candidate| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h.trim()))
}

pub fn load_csv(path: &Path) -> Result<Vec<ReviewRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let review_col = find_column(&headers, &REVIEW_COLUMNS).ok_or_else(|| ReviewError::MissingColumn {
        path: path.to_path_buf(),
        columns: headers.iter().map(String::from).collect(),
    })?;
    let date_col = find_column(&headers, &DATE_COLUMNS);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row?;
        let review = row.get(review_col).unwrap_or("").trim();
        if review.is_empty() {
            skipped += 1;
            continue;
        }
        let date = date_col.and_then(|c| row.get(c)).unwrap_or("").trim();
        records.push(ReviewRecord {
            date: date.to_string(),
            review: review.to_string(),
        });
    }
    if skipped > 0 {
        debug!(path = %path.display(), skipped, "dropped rows without review text");
    }
    Ok(records)
}

pub fn load_json(path: &Path) -> Result<Vec<ReviewRecord>> {
    let file = File::open(path)?;
    let records: Vec<ReviewRecord> = serde_json::from_reader(file)?;
    Ok(records
        .into_iter()
        .filter(|r| !r.review.trim().is_empty())
        .collect())
}

/// Dataset files under `dir` with one of `exts`, skipping previously cleaned
/// `clean_*` outputs. Sorted for a stable processing order.
pub fn dataset_files(dir: &Path, exts: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with("clean_"))
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| exts.contains(&ext))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Load a single dataset file or every dataset file in a directory.
pub fn load_reviews(path: &Path) -> Result<Vec<ReviewRecord>> {
    let files = if path.is_dir() {
        dataset_files(path, &["csv", "json"])
    } else {
        vec![path.to_path_buf()]
    };

    let mut records = Vec::new();
    for file in files {
        let ext = file.extension().and_then(|s| s.to_str()).unwrap_or("");
        let loaded = match ext {
            "csv" => load_csv(&file)?,
            "json" => load_json(&file)?,
            _ => return Err(ReviewError::UnsupportedFormat(ext.to_string())),
        };
        info!(path = %file.display(), reviews = loaded.len(), "loaded dataset");
        records.extend(loaded);
    }
    Ok(records)
}

/// Write `clean_<name>.csv` next to `path` with the review column normalized.
/// Other columns are copied unchanged.
pub fn clean_csv(path: &Path, lexicon: &Lexicon) -> Result<PathBuf> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let review_col = find_column(&headers, &REVIEW_COLUMNS).ok_or_else(|| ReviewError::MissingColumn {
        path: path.to_path_buf(),
        columns: headers.iter().map(String::from).collect(),
    })?;

    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "reviews.csv".to_string());
    let out = path.with_file_name(format!("clean_{}", file_name));

    let mut writer = csv::Writer::from_path(&out)?;
    writer.write_record(&headers)?;
    let mut non_empty = 0usize;
    for row in reader.records() {
        let row = row?;
        let cleaned: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, field)| if i == review_col { normalize(field, lexicon) } else { field.to_string() })
            .collect();
        if !cleaned[review_col].is_empty() {
            non_empty += 1;
        }
        writer.write_record(&cleaned)?;
    }
    writer.flush()?;

    if non_empty == 0 {
        warn!(path = %path.display(), "no non-empty reviews after cleaning");
    }
    info!(input = %path.display(), output = %out.display(), non_empty, "cleaned dataset");
    Ok(out)
}

#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Review")]
    review: &'a str,
    #[serde(rename = "Aspect")]
    aspect: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Raw_Review")]
    raw_review: &'a str,
    #[serde(rename = "Sentiment")]
    sentiment: &'static str,
    #[serde(rename = "Score")]
    score: u8,
    #[serde(rename = "Year")]
    year: Option<i32>,
    #[serde(rename = "Month")]
    month: Option<u32>,
}

pub fn write_scored_csv(path: &Path, clauses: &[ScoredClause]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for c in clauses {
        writer.serialize(ScoredRow {
            date: c.clause.source_date.map(|d| d.to_string()).unwrap_or_default(),
            review: &c.clause.normalized_text,
            aspect: &c.aspect,
            description: &c.opinion,
            raw_review: &c.clause.raw_text,
            sentiment: c.sentiment.as_str(),
            score: c.star_rating.value(),
            year: c.year,
            month: c.month,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_scraped_date() {
        let date = parse_review_date("Reviewed in India on 12 March 2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
    }

    #[test]
    fn test_parse_other_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 11, 5).unwrap();
        assert_eq!(parse_review_date("November 5, 2023"), Some(expected));
        assert_eq!(parse_review_date("2023-11-05"), Some(expected));
        assert_eq!(parse_review_date("not a date"), None);
        assert_eq!(parse_review_date(""), None);
    }

    #[test]
    fn test_load_csv_detects_columns() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("phone.csv");
        fs::write(
            &path,
            "Date,Review,Summary\n12 March 2024,Battery is great,ok\n13 March 2024,,empty\n",
        )?;
        let records = load_csv(&path)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, "12 March 2024");
        assert_eq!(records[0].review, "Battery is great");
        Ok(())
    }

    #[test]
    fn test_load_csv_missing_review_column() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Date,Body\n2024-01-01,hello\n")?;
        assert!(matches!(load_csv(&path), Err(ReviewError::MissingColumn { .. })));
        Ok(())
    }

    #[test]
    fn test_load_json() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("reviews.json");
        fs::write(&path, r#"[{"date": "2024-01-02", "review": "Loud speaker"}, {"review": " "}]"#)?;
        let records = load_json(&path)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].review, "Loud speaker");
        Ok(())
    }

    #[test]
    fn test_load_directory_skips_cleaned_files() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.csv"), "Date,review\n2024-01-01,first one here\n")?;
        fs::write(dir.path().join("clean_a.csv"), "Date,review\n2024-01-01,first\n")?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;
        fs::write(dir.path().join("b.json"), r#"[{"date": "2024-01-03", "review": "second"}]"#)?;

        let records = load_reviews(dir.path())?;
        let reviews: Vec<&str> = records.iter().map(|r| r.review.as_str()).collect();
        assert_eq!(reviews, vec!["first one here", "second"]);
        Ok(())
    }

    #[test]
    fn test_clean_csv_writes_sibling_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("earbuds.csv");
        fs::write(&path, "Date,Review\n2024-01-01,The batteries don't last\n")?;

        let out = clean_csv(&path, &Lexicon::english())?;
        assert_eq!(out.file_name().unwrap(), "clean_earbuds.csv");
        let content = fs::read_to_string(&out)?;
        assert!(content.contains("battery not last"));
        assert!(content.starts_with("Date,Review"));
        Ok(())
    }
}
