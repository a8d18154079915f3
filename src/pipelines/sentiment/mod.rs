//! Sentiment analysis pipeline.
//!
//! Classify text as `Positive`, `Negative`, or `Neutral`, with a signed
//! polarity score and a confidence value.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sheet_sentiment::core::ModelSource;
//! use sheet_sentiment::pipelines::sentiment::SentimentAnalysisPipelineBuilder;
//!
//! # #[tokio::main]
//! # async fn main() -> sheet_sentiment::core::Result<()> {
//! let pipeline = SentimentAnalysisPipelineBuilder::distilbert(ModelSource::distilbert())
//!     .cpu()
//!     .build()
//!     .await?;
//! let result = pipeline.predict("The agent resolved my issue quickly!")?;
//!
//! // Positive (score 0.99, confidence 0.99)
//! println!("{} (score {:.2}, confidence {:.2})", result.label, result.score, result.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Models
//!
//! | Model | Checkpoint | Builder Method |
//! |-------|------------|----------------|
//! | DistilBERT | `distilbert-base-uncased-finetuned-sst-2-english` | [`SentimentAnalysisPipelineBuilder::distilbert`] |
//! | RoBERTa | `cardiffnlp/twitter-roberta-base-sentiment-latest` | [`SentimentAnalysisPipelineBuilder::roberta`] |
//!
//! The lexicon scorers in [`crate::models`] implement [`Classifier`] directly.

pub mod builder;
pub mod model;
pub mod pipeline;

pub use builder::SentimentAnalysisPipelineBuilder;
pub use model::{Classifier, SentimentAnalysisModel};
pub use pipeline::{Label, SentimentAnalysisPipeline, SentimentResult};
