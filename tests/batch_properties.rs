// Integration tests for the batch runner over the lexicon models.
// These run offline; neural models live in neural_models.rs.

use sheet_sentiment::batch::{lexicon_ensemble, load_classifier, BatchRunner, ModelKind, Progress};
use sheet_sentiment::core::AnalysisConfig;
use sheet_sentiment::pipelines::utils::DeviceRequest;
use sheet_sentiment::{Label, SentimentResult};

const FEEDBACK: [Option<&str>; 8] = [
    Some("The agent was extremely helpful and resolved my issue quickly!"),
    Some("Terrible experience, I waited an hour and nobody answered."),
    None,
    Some(""),
    Some("I called about my invoice on Tuesday."),
    Some("Not good at all :("),
    Some("Great product but the delivery was slow"),
    Some("   "),
];

async fn runner(kind: ModelKind) -> anyhow::Result<BatchRunner> {
    let config = AnalysisConfig::default();
    let loaded = load_classifier(kind, &config, DeviceRequest::Cpu).await?;
    Ok(BatchRunner::from_loaded(loaded, &config))
}

fn assert_well_formed(results: &[SentimentResult]) {
    assert_eq!(results.len(), FEEDBACK.len());
    for result in results {
        assert!(Label::ALL.contains(&result.label));
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!((-1.0..=1.0).contains(&result.score));
    }
    for empty in [2, 3, 7] {
        assert_eq!(results[empty], SentimentResult::neutral());
    }
}

#[tokio::test]
async fn lexicon_models_keep_output_shape() -> anyhow::Result<()> {
    for kind in [ModelKind::TextBlob, ModelKind::Vader] {
        let output = runner(kind).await?.run(&FEEDBACK, |_| {});
        assert_well_formed(&output.results);
        assert_eq!(output.run.model, kind);
        assert_eq!(output.run.counts.total(), output.run.total);
        assert_eq!(output.run.failed, 0);
    }
    Ok(())
}

#[test]
fn lexicon_ensemble_keeps_output_shape() -> anyhow::Result<()> {
    let config = AnalysisConfig::default();
    let runner = BatchRunner::new(
        ModelKind::Ensemble,
        Box::new(lexicon_ensemble(&config)?),
        &config,
    );
    let output = runner.run(&FEEDBACK, |_| {});
    assert_well_formed(&output.results);
    assert_eq!(output.results[0].label, Label::Positive);
    assert_eq!(output.results[1].label, Label::Negative);
    Ok(())
}

#[tokio::test]
async fn vader_reads_obvious_sentiment() -> anyhow::Result<()> {
    let output = runner(ModelKind::Vader).await?.run(&FEEDBACK, |_| {});
    assert_eq!(output.results[0].label, Label::Positive);
    assert_eq!(output.results[1].label, Label::Negative);
    assert_eq!(output.results[4].label, Label::Neutral);
    assert_eq!(output.results[5].label, Label::Negative);
    assert!(output.results[1].score < 0.0);
    Ok(())
}

#[tokio::test]
async fn progress_ends_at_total() -> anyhow::Result<()> {
    let mut updates = Vec::new();
    runner(ModelKind::TextBlob)
        .await?
        .run(&FEEDBACK, |p| updates.push(p));

    assert_eq!(updates.len(), FEEDBACK.len());
    assert_eq!(
        updates.last(),
        Some(&Progress {
            completed: FEEDBACK.len(),
            total: FEEDBACK.len()
        })
    );
    assert!(updates.windows(2).all(|w| w[0].completed < w[1].completed));
    Ok(())
}

#[tokio::test]
async fn unknown_selector_fails_before_any_row() -> anyhow::Result<()> {
    let config = AnalysisConfig::default();
    let result = BatchRunner::for_selector("sentiment-9000", &config, DeviceRequest::Cpu).await;
    let err = match result {
        Ok(_) => anyhow::bail!("unknown selector was accepted"),
        Err(e) => e,
    };
    assert!(err.is_configuration());
    Ok(())
}
