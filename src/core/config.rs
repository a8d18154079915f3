//! Analysis settings loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```toml
//! progress_interval = 50
//! max_chars = 500
//!
//! [thresholds.vader]
//! positive = 0.05
//! negative = -0.05
//! inclusive = true
//!
//! [models.roberta]
//! model_id = "cardiffnlp/twitter-roberta-base-sentiment-latest"
//! tokenizer_id = "FacebookAI/roberta-base"
//!
//! [lexicons]
//! vader = "/opt/lexicons/vader_lexicon.txt"
//! pattern = "/opt/lexicons/en-sentiment.xml"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::{Result, SentimentError};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Emit a progress notification every this many rows.
    pub progress_interval: usize,
    /// Cells with fewer non-whitespace characters are treated as empty.
    pub min_text_chars: usize,
    /// Neural models only see the first `max_chars` characters of a cell.
    pub max_chars: usize,
    pub thresholds: Thresholds,
    pub models: ModelSources,
    pub lexicons: LexiconPaths,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            progress_interval: 1,
            min_text_chars: 1,
            max_chars: 500,
            thresholds: Thresholds::default(),
            models: ModelSources::default(),
            lexicons: LexiconPaths::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SentimentError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(SentimentError::Config(
                "progress_interval must be at least 1".into(),
            ));
        }
        if self.max_chars == 0 {
            return Err(SentimentError::Config("max_chars must be at least 1".into()));
        }
        self.thresholds.textblob.validate("textblob")?;
        self.thresholds.vader.validate("vader")?;
        Ok(())
    }
}

/// Score cut-offs that turn a signed polarity into a label.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct PolarityThresholds {
    pub positive: f32,
    pub negative: f32,
    /// `true` compares with `>=`/`<=`, `false` with `>`/`<`.
    #[serde(default)]
    pub inclusive: bool,
}

impl PolarityThresholds {
    fn validate(&self, name: &str) -> Result<()> {
        if self.negative > self.positive {
            return Err(SentimentError::Config(format!(
                "{name} thresholds: negative ({}) is above positive ({})",
                self.negative, self.positive
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub textblob: PolarityThresholds,
    pub vader: PolarityThresholds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            textblob: PolarityThresholds {
                positive: 0.1,
                negative: -0.1,
                inclusive: false,
            },
            vader: PolarityThresholds {
                positive: 0.05,
                negative: -0.05,
                inclusive: true,
            },
        }
    }
}

/// Where a neural classifier and its tokenizer are fetched from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct ModelSource {
    pub model_id: String,
    /// Repository providing `tokenizer.json`, when the model repo lacks one.
    pub tokenizer_id: String,
    #[serde(default = "default_revision")]
    pub revision: String,
}

fn default_revision() -> String {
    "main".to_string()
}

impl ModelSource {
    pub fn new(model_id: impl Into<String>, tokenizer_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            tokenizer_id: tokenizer_id.into(),
            revision: default_revision(),
        }
    }

    pub fn distilbert() -> Self {
        Self::new(
            "distilbert-base-uncased-finetuned-sst-2-english",
            "distilbert-base-uncased",
        )
    }

    pub fn roberta() -> Self {
        Self::new(
            "cardiffnlp/twitter-roberta-base-sentiment-latest",
            "FacebookAI/roberta-base",
        )
    }
}

impl crate::core::ModelOptions for ModelSource {
    fn cache_key(&self) -> String {
        format!("{}@{}", self.model_id, self.revision)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSources {
    pub distilbert: ModelSource,
    pub roberta: ModelSource,
}

impl Default for ModelSources {
    fn default() -> Self {
        Self {
            distilbert: ModelSource::distilbert(),
            roberta: ModelSource::roberta(),
        }
    }
}

/// Optional external lexicons replacing the built-in ones. `pattern` accepts
/// the tab-separated format or pattern's `en-sentiment.xml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LexiconPaths {
    pub vader: Option<PathBuf>,
    pub pattern: Option<PathBuf>,
}
