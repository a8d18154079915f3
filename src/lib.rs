//! Batch sentiment analysis for spreadsheet columns.
//!
//! Every text cell of a selected column is classified as `Positive`,
//! `Negative` or `Neutral` with a signed score and a confidence, using either
//! rule-based lexicon scorers (TextBlob-style pattern lexicon, VADER) or
//! transformer checkpoints (DistilBERT, RoBERTa) run locally with Candle.

pub mod batch;
pub mod core;
pub mod models;
pub mod pipelines;
pub mod table;

pub use batch::{AnalysisRun, BatchOutput, BatchRunner, ModelKind, Progress};
pub use crate::core::{AnalysisConfig, Result, SentimentError};
pub use pipelines::sentiment::{Classifier, Label, SentimentResult};
pub use table::Table;
