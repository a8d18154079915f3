// Transformer checkpoints are downloaded from the Hugging Face Hub on first
// use, so these tests are ignored by default:
//
//     cargo test --test neural_models -- --ignored

use sheet_sentiment::core::ModelSource;
use sheet_sentiment::pipelines::sentiment::SentimentAnalysisPipelineBuilder;
use sheet_sentiment::Label;

#[tokio::test]
#[ignore = "downloads model weights"]
async fn distilbert_sentiment() -> anyhow::Result<()> {
    let pipeline = SentimentAnalysisPipelineBuilder::distilbert(ModelSource::distilbert())
        .cpu()
        .build()
        .await?;

    let positive = pipeline.predict("The support team was wonderful and fixed everything.")?;
    assert_eq!(positive.label, Label::Positive);
    assert!(positive.score > 0.0);
    assert!(positive.confidence > 0.5);

    let negative = pipeline.predict("Worst service I have ever had.")?;
    assert_eq!(negative.label, Label::Negative);
    assert!(negative.score < 0.0);
    Ok(())
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn roberta_sentiment_has_three_classes() -> anyhow::Result<()> {
    let pipeline = SentimentAnalysisPipelineBuilder::roberta(ModelSource::roberta())
        .cpu()
        .build()
        .await?;

    let probabilities = pipeline.probabilities("The parcel arrived on Tuesday.")?;
    assert_eq!(probabilities.len(), 3);
    let total: f32 = probabilities.iter().map(|(_, p)| p).sum();
    assert!((total - 1.0).abs() < 1e-4);

    let result = pipeline.predict("I love how quickly this was resolved!")?;
    assert_eq!(result.label, Label::Positive);
    Ok(())
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn long_cells_are_truncated_not_rejected() -> anyhow::Result<()> {
    let pipeline = SentimentAnalysisPipelineBuilder::distilbert(ModelSource::distilbert())
        .cpu()
        .max_chars(500)
        .build()
        .await?;

    let long = "the agent was helpful and kind. ".repeat(200);
    let result = pipeline.predict(&long)?;
    assert!((0.0..=1.0).contains(&result.confidence));
    Ok(())
}
