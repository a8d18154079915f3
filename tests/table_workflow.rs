// End-to-end table workflow: load a CSV, classify the detected column,
// append the result columns and write the file back out.

use sheet_sentiment::batch::{vader_analyzer, BatchRunner, ModelKind};
use sheet_sentiment::core::AnalysisConfig;
use sheet_sentiment::table::{default_result_base, result_column_names, Table};
use sheet_sentiment::SentimentError;

const SURVEY: &str = "\
ticket,agent,customer_feedback,rating
1001,Dana Whitfield,\"Excellent support, very patient and helpful!\",5
1002,Sam Ortega,\"Awful. Rude agent, hung up on me.\",1
1003,Lee Park,,3
1004,Ana Ruiz
";

#[test]
fn classify_csv_column_and_write_results() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("survey.csv");
    std::fs::write(&input, SURVEY)?;

    let mut table = Table::load(&input)?;
    let column = table.detect_text_column()?;
    assert_eq!(table.headers()[column], "customer_feedback");

    let config = AnalysisConfig::default();
    let runner = BatchRunner::new(ModelKind::Vader, Box::new(vader_analyzer(&config)?), &config);
    let output = runner.run(&table.text_cells(column), |_| {});
    assert_eq!(output.results.len(), table.len());

    let base = default_result_base("customer_feedback");
    table.append_results(&base, &output.results, false)?;
    let output_path = dir.path().join("survey_results.csv");
    table.save(&output_path)?;

    let reloaded = Table::load(&output_path)?;
    let [label, score, confidence] = result_column_names(&base);
    let label_col = reloaded.column_index(&label)?;
    let score_col = reloaded.column_index(&score)?;
    let confidence_col = reloaded.column_index(&confidence)?;

    let labels: Vec<&str> = reloaded
        .rows()
        .iter()
        .map(|row| row[label_col].as_str())
        .collect();
    assert_eq!(labels, vec!["Positive", "Negative", "Neutral", "Neutral"]);

    for row in reloaded.rows() {
        let score: f32 = row[score_col].parse()?;
        let confidence: f32 = row[confidence_col].parse()?;
        assert!((-1.0..=1.0).contains(&score));
        assert!((0.0..=1.0).contains(&confidence));
        assert_eq!(row[confidence_col].split('.').nth(1).map(str::len), Some(3));
    }
    Ok(())
}

#[test]
fn rerun_requires_overwrite() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("survey.tsv");
    std::fs::write(&input, "id\tcomment\n1\tall good here\n")?;

    let mut table = Table::load(&input)?;
    let results = vec![sheet_sentiment::SentimentResult::neutral(); table.len()];
    table.append_results("comment_sentiment_results", &results, false)?;

    let err = table
        .append_results("comment_sentiment_results", &results, false)
        .unwrap_err();
    assert!(matches!(err, SentimentError::OutputColumnExists(_)));
    assert!(err.is_configuration());

    table.append_results("comment_sentiment_results", &results, true)?;
    assert_eq!(table.headers().len(), 5);
    Ok(())
}

#[test]
fn named_column_must_exist() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("survey.csv");
    std::fs::write(&input, SURVEY)?;

    let table = Table::load(&input)?;
    let err = table.column_index("comments").unwrap_err();
    assert!(err.to_string().contains("customer_feedback"));
    Ok(())
}
