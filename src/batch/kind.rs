use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::SentimentError;

/// The fixed set of classifiers a batch can run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    TextBlob,
    Vader,
    DistilBert,
    Roberta,
    Ensemble,
    /// Resolves to the first of roberta, distilbert, vader, textblob that loads.
    Auto,
}

/// Human-facing description used by the `models` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub display_name: &'static str,
    pub level: &'static str,
    pub speed: &'static str,
    pub description: &'static str,
}

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::TextBlob,
        ModelKind::Vader,
        ModelKind::DistilBert,
        ModelKind::Roberta,
        ModelKind::Ensemble,
        ModelKind::Auto,
    ];

    /// Order tried by [`ModelKind::Auto`].
    pub const AUTO_ORDER: [ModelKind; 4] = [
        ModelKind::Roberta,
        ModelKind::DistilBert,
        ModelKind::Vader,
        ModelKind::TextBlob,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::TextBlob => "textblob",
            ModelKind::Vader => "vader",
            ModelKind::DistilBert => "distilbert",
            ModelKind::Roberta => "roberta",
            ModelKind::Ensemble => "ensemble",
            ModelKind::Auto => "auto",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ModelKind::TextBlob => &["fast-lexicon-a", "pattern"],
            ModelKind::Vader => &["fast-lexicon-b"],
            ModelKind::DistilBert => &["balanced-neural"],
            ModelKind::Roberta => &["high-accuracy-neural"],
            ModelKind::Ensemble | ModelKind::Auto => &[],
        }
    }

    /// Whether loading needs model weights from the Hugging Face Hub.
    pub fn is_neural(&self) -> bool {
        matches!(self, ModelKind::DistilBert | ModelKind::Roberta)
    }

    pub fn info(&self) -> ModelInfo {
        match self {
            ModelKind::TextBlob => ModelInfo {
                display_name: "TextBlob",
                level: "Basic",
                speed: "Very Fast",
                description: "Pattern lexicon polarity averaged over words",
            },
            ModelKind::Vader => ModelInfo {
                display_name: "VADER",
                level: "Lightweight",
                speed: "Very Fast",
                description: "Social media optimized valence lexicon with rules",
            },
            ModelKind::DistilBert => ModelInfo {
                display_name: "DistilBERT",
                level: "Standard",
                speed: "Fast",
                description: "DistilBERT fine-tuned on SST-2 (positive/negative)",
            },
            ModelKind::Roberta => ModelInfo {
                display_name: "RoBERTa-Twitter",
                level: "Professional",
                speed: "Medium",
                description: "RoBERTa trained on Twitter data (three classes)",
            },
            ModelKind::Ensemble => ModelInfo {
                display_name: "Ensemble",
                level: "Professional",
                speed: "Medium",
                description: "Weighted vote of RoBERTa, VADER, a support-desk lexicon and TextBlob",
            },
            ModelKind::Auto => ModelInfo {
                display_name: "Auto",
                level: "-",
                speed: "-",
                description: "Best model that loads: RoBERTa, DistilBERT, VADER, then TextBlob",
            },
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted || kind.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| SentimentError::UnknownModel(s.to_string()))
    }
}
