//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use sheet_sentiment::batch::{load_classifier, BatchRunner, ModelKind};
use sheet_sentiment::core::AnalysisConfig;
use sheet_sentiment::pipelines::sentiment::{Classifier, Label, SentimentResult};
use sheet_sentiment::pipelines::utils::DeviceRequest;
use sheet_sentiment::table::{default_output_path, default_result_base, Table};

#[derive(Parser)]
#[command(name = "sheet-sentiment")]
#[command(about = "Classify the sentiment of every row in a spreadsheet column")]
#[command(version)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one column of a table or workbook and write the results next to it
    Analyze(AnalyzeArgs),

    /// List the available models
    Models,

    /// Classify texts given on the command line
    Classify {
        /// Texts to classify
        #[arg(required = true)]
        text: Vec<String>,

        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// Model to use (see `models`)
    #[arg(short, long, default_value = "auto", env = "SHEET_SENTIMENT_MODEL")]
    model: String,

    /// TOML configuration file
    #[arg(short, long, env = "SHEET_SENTIMENT_CONFIG")]
    config: Option<PathBuf>,

    /// Run neural models on the CPU even when CUDA is available
    #[arg(long)]
    cpu: bool,

    /// Characters of each cell passed to neural models (overrides config)
    #[arg(long)]
    max_chars: Option<usize>,
}

impl ModelArgs {
    fn load_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = AnalysisConfig::load(self.config.as_deref())
            .context("failed to load configuration")?;
        if let Some(max_chars) = self.max_chars {
            config.max_chars = max_chars;
        }
        config.validate()?;
        Ok(config)
    }

    fn device(&self) -> DeviceRequest {
        if self.cpu {
            DeviceRequest::Cpu
        } else {
            DeviceRequest::Default
        }
    }
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Input table (.csv, .tsv/.tab, or an .xlsx/.xls/.ods workbook)
    input: PathBuf,

    /// Column to analyze (detected from the header when omitted)
    #[arg(long)]
    column: Option<String>,

    /// Output file, .csv/.tsv/.xlsx [default: <input>_sentiment_analysis_<timestamp>, same format as the input; workbooks as .xlsx]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base name for the result columns [default: <column>_sentiment_results]
    #[arg(long)]
    output_column: Option<String>,

    /// Replace result columns that already exist
    #[arg(long)]
    overwrite: bool,

    /// Also write the run summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,

    #[command(flatten)]
    model: ModelArgs,
}

/// Default log filter for `-v` repetitions.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "sheet_sentiment=warn",
        1 => "sheet_sentiment=info",
        2 => "sheet_sentiment=debug",
        _ => "sheet_sentiment=trace",
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze(args) => analyze(args).await,
        Commands::Models => {
            list_models();
            Ok(())
        }
        Commands::Classify { text, model } => classify(text, model).await,
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = args.model.load_config()?;
    let kind: ModelKind = args.model.model.parse()?;

    let mut table = Table::load(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let column = match &args.column {
        Some(name) => table.column_index(name)?,
        None => table.detect_text_column()?,
    };
    let source = table.headers()[column].clone();
    let base = args
        .output_column
        .clone()
        .unwrap_or_else(|| default_result_base(&source));
    table.check_output_columns(&base, column, args.overwrite)?;

    println!(
        "{} Analyzing column '{}' ({} rows)",
        style("→").cyan(),
        source,
        table.len()
    );

    let loading = spinner("Loading model...");
    let loaded = load_classifier(kind, &config, args.model.device()).await;
    loading.finish_and_clear();
    let loaded = loaded.context("failed to load model")?;
    println!(
        "{} Using {}",
        style("✓").green(),
        loaded.kind.info().display_name
    );

    let runner = BatchRunner::from_loaded(loaded, &config);
    let cells: Vec<Option<String>> = table
        .text_cells(column)
        .into_iter()
        .map(|cell| cell.map(str::to_string))
        .collect();

    let progress = ProgressBar::new(cells.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .context("invalid progress template")?
            .progress_chars("█▓░"),
    );
    progress.set_message("Classifying...");

    let bar = progress.clone();
    let output = tokio::task::spawn_blocking(move || {
        let cells: Vec<Option<&str>> = cells.iter().map(|c| c.as_deref()).collect();
        runner.run(&cells, |p| {
            bar.set_length(p.total as u64);
            bar.set_position(p.completed as u64);
        })
    })
    .await
    .context("classification worker stopped unexpectedly")?;
    progress.finish_with_message("done");

    table.append_results(&base, &output.results, args.overwrite)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, Local::now()));
    table
        .save(&output_path)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    println!();
    println!("{}", output.run);
    println!(
        "{} Results written to {}",
        style("✓").green(),
        output_path.display()
    );

    if let Some(summary) = &args.summary {
        let json = serde_json::to_string_pretty(&output.run)?;
        std::fs::write(summary, json)
            .with_context(|| format!("failed to write {}", summary.display()))?;
    }
    Ok(())
}

fn list_models() {
    println!(
        "{:<12} {:<16} {:<13} {:<10} DESCRIPTION",
        "NAME", "DISPLAY", "LEVEL", "SPEED"
    );
    for kind in ModelKind::ALL {
        let info = kind.info();
        println!(
            "{:<12} {:<16} {:<13} {:<10} {}",
            style(kind.name()).cyan(),
            info.display_name,
            info.level,
            info.speed,
            info.description
        );
        if !kind.aliases().is_empty() {
            println!("{:<12} aliases: {}", "", kind.aliases().join(", "));
        }
    }
}

async fn classify(texts: Vec<String>, args: ModelArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let kind: ModelKind = args.model.parse()?;
    let loaded = load_classifier(kind, &config, args.device())
        .await
        .context("failed to load model")?;

    for text in &texts {
        let result = classify_or_neutral(loaded.classifier.as_ref(), text);
        let label = match result.label {
            Label::Positive => style(result.label.as_str()).green(),
            Label::Negative => style(result.label.as_str()).red(),
            Label::Neutral => style(result.label.as_str()).yellow(),
        };
        println!(
            "{:<8} score {:+.3}  confidence {:.3}  {}",
            label, result.score, result.confidence, text
        );
    }
    Ok(())
}

/// One ad-hoc text; a failure is logged and reported as the neutral default.
fn classify_or_neutral(classifier: &dyn Classifier, text: &str) -> SentimentResult {
    match classifier.classify(text) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, text, "classification failed, defaulting to Neutral");
            SentimentResult::neutral()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_sentiment::SentimentError;

    struct FailsOnEmpty;

    impl Classifier for FailsOnEmpty {
        fn classify(&self, text: &str) -> sheet_sentiment::Result<SentimentResult> {
            if text.is_empty() {
                return Err(SentimentError::Tokenization("empty input".into()));
            }
            Ok(SentimentResult {
                label: Label::Positive,
                score: 0.8,
                confidence: 0.8,
            })
        }
    }

    #[test]
    fn failing_text_does_not_stop_the_rest() {
        let results: Vec<_> = ["great", "", "fine"]
            .iter()
            .map(|text| classify_or_neutral(&FailsOnEmpty, text))
            .collect();
        assert_eq!(results[0].label, Label::Positive);
        assert_eq!(results[1], SentimentResult::neutral());
        assert_eq!(results[2].label, Label::Positive);
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(default_filter(0), "sheet_sentiment=warn");
        assert_eq!(default_filter(5), "sheet_sentiment=trace");
    }
}
