// reviewlens: aspect-based review analysis from the command line.
// Reviews are split into clauses, cleaned, matched against dependency parses
// produced by an external parser, and rolled up into a per-aspect report.
mod config;
mod dataset;
mod error;
mod nlp;
mod pipeline;
mod report;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AnalysisConfig;
use crate::nlp::{extract, split_clauses, CommandModel, Lexicon, LexiconModel, ParseTable, SentimentModel};
use crate::pipeline::Pipeline;
use crate::report::{build_report, Report};

#[derive(Parser)]
#[command(name = "reviewlens", about = "Aspect-based sentiment summaries for product reviews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a review dataset and write the aspect report
    Analyze {
        /// CSV/JSON dataset, or a directory of them
        #[arg(short, long)]
        input: PathBuf,
        /// Dependency parses of the cleaned clauses (.json or .conllu)
        #[arg(short, long)]
        parses: PathBuf,
        #[arg(short, long, default_value = "reviewlens_report.json")]
        out: PathBuf,
        /// Also write every scored clause as CSV
        #[arg(long)]
        clauses: Option<PathBuf>,
        /// Detail a single aspect instead of the top aspects
        #[arg(short, long)]
        aspect: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write clean_<name>.csv with the review column normalized
    Clean {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Show how a review is split into clauses
    Split {
        #[arg(short, long)]
        text: String,
        #[arg(long, default_value_t = nlp::clauses::MIN_CLAUSE_TOKENS)]
        min_tokens: usize,
    },
    /// Print the aspect/opinion pairs found in a parse dump
    Extract {
        #[arg(short, long)]
        parses: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config = match path {
        Some(p) => AnalysisConfig::load(p).with_context(|| format!("loading config {}", p.display()))?,
        None => AnalysisConfig::default(),
    };
    Ok(config.with_env())
}

fn load_model(config: &AnalysisConfig) -> Result<Box<dyn SentimentModel>> {
    match &config.classifier_command {
        Some(argv) => {
            info!(command = %argv.join(" "), "using external classifier");
            Ok(Box::new(CommandModel::new(argv)?))
        }
        None => Ok(Box::new(LexiconModel)),
    }
}

fn run_analyze(
    input: &Path,
    parses: &Path,
    out: &Path,
    clauses_out: Option<&Path>,
    aspect: Option<&str>,
    config: &AnalysisConfig,
) -> Result<Report> {
    let lexicon = Lexicon::english();
    let records = dataset::load_reviews(input).with_context(|| format!("loading reviews from {}", input.display()))?;
    let table = ParseTable::load(parses).with_context(|| format!("loading parses from {}", parses.display()))?;
    let model = load_model(config)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let scored = Pipeline::new(&lexicon, &table, model.as_ref())
        .with_min_clause_tokens(config.min_clause_tokens)
        .with_progress(pb)
        .run(&records)?;

    if let Some(path) = clauses_out {
        dataset::write_scored_csv(path, &scored)?;
        info!(path = %path.display(), rows = scored.len(), "wrote scored clauses");
    }

    let report = build_report(&scored, config, aspect);
    let fout = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    serde_json::to_writer_pretty(fout, &report)?;
    println!("Wrote report to {}", out.display());
    Ok(report)
}

fn run_clean(input: &Path) -> Result<Vec<PathBuf>> {
    let lexicon = Lexicon::english();
    let files = if input.is_dir() {
        dataset::dataset_files(input, &["csv"])
    } else {
        vec![input.to_path_buf()]
    };
    if files.is_empty() {
        println!("No CSV files found in {}", input.display());
    }

    let mut written = Vec::new();
    for file in files {
        match dataset::clean_csv(&file, &lexicon) {
            Ok(out) => {
                println!("Cleaned {} -> {}", file.display(), out.display());
                written.push(out);
            }
            Err(e) => eprintln!("Failed to clean {}: {}", file.display(), e),
        }
    }
    Ok(written)
}

fn run_split(text: &str, min_tokens: usize) {
    let lexicon = Lexicon::english();
    for clause in split_clauses(text, &lexicon, min_tokens) {
        println!("{}\t{}", clause.raw, clause.normalized);
    }
}

fn run_extract(parses: &Path) -> Result<()> {
    let table = ParseTable::load(parses).with_context(|| format!("loading parses from {}", parses.display()))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for clause in table.clauses() {
        let result = extract(clause);
        let line = json!({ "text": clause.text(), "pairs": result.pairs() });
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn score_color(mean: f64) -> Color {
    if mean >= 3.5 {
        Color::Green
    } else if mean < 2.5 {
        Color::Red
    } else {
        Color::Yellow
    }
}

fn print_summary(report: &Report) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let s = &report.summary;
    writeln!(
        stdout,
        "{} clauses: {} positive, {} negative, {} neutral, {} aspects",
        s.total_clauses, s.positive, s.negative, s.neutral, s.unique_aspects
    )?;
    for score in &report.aspect_scores {
        stdout.set_color(ColorSpec::new().set_fg(Some(score_color(score.mean_score))))?;
        write!(stdout, "{:>5.2}", score.mean_score)?;
        stdout.reset()?;
        writeln!(stdout, "  {} ({} mentions)", score.aspect, score.mentions)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reviewlens=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { input, parses, out, clauses, aspect, config } => {
            let config = load_config(config.as_deref())?;
            let report = run_analyze(&input, &parses, &out, clauses.as_deref(), aspect.as_deref(), &config)?;
            print_summary(&report)?;
        }
        Commands::Clean { input } => {
            run_clean(&input)?;
        }
        Commands::Split { text, min_tokens } => run_split(&text, min_tokens),
        Commands::Extract { parses } => run_extract(&parses)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONLLU: &str = "# text = really great battery backup
1\treally\treally\tADV\tRB\t_\t2\tadvmod\t_\t_
2\tgreat\tgreat\tADJ\tJJ\t_\t4\tamod\t_\t_
3\tbattery\tbattery\tNOUN\tNN\t_\t4\tcompound\t_\t_
4\tbackup\tbackup\tNOUN\tNN\t_\t0\tROOT\t_\t_

# text = sound quality amazing
1\tsound\tsound\tNOUN\tNN\t_\t2\tcompound\t_\t_
2\tquality\tquality\tNOUN\tNN\t_\t3\tnsubj\t_\t_
3\tamazing\tamazing\tINTJ\tUH\t_\t0\tROOT\t_\t_

";

    fn write_fixture(dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let input = dir.join("earbuds.csv");
        fs::write(
            &input,
            "Date,Review\n\
             Reviewed in India on 12 March 2024,Really great battery backup. Ok\n\
             Reviewed in India on 2 April 2024,The sound quality is amazing\n\
             Reviewed in India on 3 April 2024,Charging case broke within days\n",
        )?;
        let parses = dir.join("parses.conllu");
        fs::write(&parses, CONLLU)?;
        Ok((input, parses))
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "reviewlens", "analyze", "--input", "r.csv", "--parses", "p.json", "--aspect", "battery",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { input, out, aspect, .. } => {
                assert_eq!(input, PathBuf::from("r.csv"));
                assert_eq!(out, PathBuf::from("reviewlens_report.json"));
                assert_eq!(aspect.as_deref(), Some("battery"));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_cli_split_default_min_tokens() {
        let cli = Cli::try_parse_from(["reviewlens", "split", "--text", "a b c"]).unwrap();
        assert!(matches!(cli.command, Commands::Split { min_tokens: 3, .. }));
    }

    #[test]
    fn test_analyze_end_to_end() -> Result<()> {
        let dir = TempDir::new()?;
        let (input, parses) = write_fixture(dir.path())?;
        let out = dir.path().join("report.json");
        let csv_out = dir.path().join("scored.csv");

        let report = run_analyze(&input, &parses, &out, Some(&csv_out), None, &AnalysisConfig::default())?;

        assert_eq!(report.summary.total_clauses, 3);
        let aspects: Vec<&str> = report.aspect_scores.iter().map(|a| a.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["backup", "quality"]);
        assert!(out.exists());

        let saved: serde_json::Value = serde_json::from_reader(File::open(&out)?)?;
        assert_eq!(saved["summary"]["total_clauses"], 3);

        let scored = fs::read_to_string(&csv_out)?;
        assert!(scored.starts_with("Date,Review,Aspect,Description,Raw_Review,Sentiment,Score,Year,Month"));
        assert!(scored.contains("backup,really great"));
        assert!(scored.contains("neutral,neutral"));
        Ok(())
    }

    #[test]
    fn test_analyze_single_aspect() -> Result<()> {
        let dir = TempDir::new()?;
        let (input, parses) = write_fixture(dir.path())?;
        let out = dir.path().join("report.json");

        let report = run_analyze(&input, &parses, &out, None, Some("quality"), &AnalysisConfig::default())?;
        assert_eq!(report.aspects.len(), 1);
        assert_eq!(report.aspects[0].word_cloud[0].term, "amazing");
        Ok(())
    }

    #[test]
    fn test_clean_directory() -> Result<()> {
        let dir = TempDir::new()?;
        write_fixture(dir.path())?;
        let written = run_clean(dir.path())?;
        assert_eq!(written, vec![dir.path().join("clean_earbuds.csv")]);

        // cleaned outputs are not picked up again
        let again = run_clean(dir.path())?;
        assert_eq!(again.len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_model_defaults_to_lexicon() -> Result<()> {
        let model = load_model(&AnalysisConfig::default())?;
        assert_eq!(model.predict("great")?.value(), 4);
        Ok(())
    }

    #[test]
    fn test_score_color() {
        assert_eq!(score_color(4.2), Color::Green);
        assert_eq!(score_color(3.0), Color::Yellow);
        assert_eq!(score_color(1.5), Color::Red);
    }
}
