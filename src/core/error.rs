use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    // Configuration: raised before any row is processed
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Column '{column}' not found (available: {})", .available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("No text column could be detected; pass one explicitly")]
    NoTextColumn,

    #[error("Unknown model '{0}' (expected one of: textblob, vader, distilbert, roberta, ensemble, auto)")]
    UnknownModel(String),

    #[error("Output column '{0}' already exists; use --overwrite to replace it")]
    OutputColumnExists(String),

    #[error("Result column '{0}' would replace the analyzed text column")]
    OutputOverwritesSource(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Spreadsheet error: {0}")]
    Workbook(String),

    // Model loading
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Invalid lexicon entry at line {line}: {reason}")]
    Lexicon { line: usize, reason: String },

    // Per-row
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Classification failed: {0}")]
    Classification(String),

    // Pass-through from dependencies
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SentimentError>;

impl SentimentError {
    /// Whether this error belongs to the class reported to the operator before
    /// a batch starts, as opposed to a failure tied to a single input row.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            SentimentError::Tokenization(_)
                | SentimentError::Classification(_)
                | SentimentError::Candle(_)
        )
    }
}

impl From<hf_hub::api::sync::ApiError> for SentimentError {
    fn from(value: hf_hub::api::sync::ApiError) -> Self {
        SentimentError::Download(value.to_string())
    }
}

impl From<calamine::Error> for SentimentError {
    fn from(value: calamine::Error) -> Self {
        SentimentError::Workbook(value.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SentimentError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        SentimentError::Workbook(value.to_string())
    }
}
