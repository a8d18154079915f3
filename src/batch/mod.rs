//! Batch classification of table cells.
//!
//! ```rust,no_run
//! use sheet_sentiment::batch::BatchRunner;
//! use sheet_sentiment::core::AnalysisConfig;
//! use sheet_sentiment::pipelines::utils::DeviceRequest;
//!
//! # #[tokio::main]
//! # async fn main() -> sheet_sentiment::core::Result<()> {
//! let config = AnalysisConfig::default();
//! let runner = BatchRunner::for_selector("vader", &config, DeviceRequest::Cpu).await?;
//! let cells = [Some("Great support!"), None, Some("Still waiting for a refund")];
//! let output = runner.run(&cells, |p| eprintln!("{}/{}", p.completed, p.total));
//!
//! println!("{}", output.run);
//! # Ok(())
//! # }
//! ```

pub mod kind;
pub mod loader;
pub mod runner;
pub mod summary;

pub use kind::{ModelInfo, ModelKind};
pub use loader::{
    lexicon_ensemble, load_classifier, load_classifier_by_name, pattern_analyzer, vader_analyzer,
    LoadedClassifier,
};
pub use runner::{BatchOutput, BatchRunner, Progress};
pub use summary::{AnalysisRun, LabelCounts, HIGH_CONFIDENCE};

pub use crate::pipelines::sentiment::Classifier;
