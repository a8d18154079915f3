use std::fmt;

use serde::Serialize;
use tokenizers::Tokenizer;

use super::model::{Classifier, SentimentAnalysisModel};
use crate::core::{PolarityThresholds, Result};
use crate::pipelines::utils::truncate_chars;

/// The three sentiment outcomes every classifier reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Positive, Label::Negative, Label::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "Positive",
            Label::Negative => "Negative",
            Label::Neutral => "Neutral",
        }
    }

    /// Maps a checkpoint's own class name (`POSITIVE`, `negative`, `LABEL_2`...)
    /// onto the three-way vocabulary.
    pub fn from_model_label(raw: &str) -> Label {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("pos") {
            Label::Positive
        } else if lower.contains("neg") {
            Label::Negative
        } else {
            Label::Neutral
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one piece of text.
///
/// `score` is signed polarity in `[-1, 1]` (negative sentiment is negative);
/// `confidence` is the classifier's certainty in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentResult {
    pub label: Label,
    pub score: f32,
    pub confidence: f32,
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}

impl SentimentResult {
    /// Result used for empty cells and rows that failed to classify.
    pub fn neutral() -> Self {
        Self {
            label: Label::Neutral,
            score: 0.0,
            confidence: 0.0,
        }
    }

    /// Labels a lexicon polarity. Polar results report `|score|` as confidence,
    /// neutral ones `1 - |score|`.
    pub fn from_polarity(score: f32, thresholds: &PolarityThresholds) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let (positive, negative) = if thresholds.inclusive {
            (score >= thresholds.positive, score <= thresholds.negative)
        } else {
            (score > thresholds.positive, score < thresholds.negative)
        };

        let (label, confidence) = if positive {
            (Label::Positive, score.abs())
        } else if negative {
            (Label::Negative, score.abs())
        } else {
            (Label::Neutral, 1.0 - score.abs())
        };

        Self {
            label,
            score,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Collapses a class distribution into a result: the most probable class
    /// wins, its probability is the confidence and the score is
    /// `p(positive) - p(negative)`.
    pub fn from_probabilities(probabilities: &[(String, f32)]) -> Self {
        let Some((top_label, top_prob)) = probabilities
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            return Self::neutral();
        };

        let mut score = 0.0f32;
        for (raw, prob) in probabilities {
            match Label::from_model_label(raw) {
                Label::Positive => score += prob,
                Label::Negative => score -= prob,
                Label::Neutral => {}
            }
        }

        Self {
            label: Label::from_model_label(top_label),
            score: score.clamp(-1.0, 1.0),
            confidence: top_prob.clamp(0.0, 1.0),
        }
    }
}

pub struct SentimentAnalysisPipeline<M: SentimentAnalysisModel> {
    pub(crate) model: M,
    pub(crate) tokenizer: Tokenizer,
    pub(crate) max_chars: usize,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipeline<M> {
    /// Predict sentiment with structured result containing label, score and confidence
    pub fn predict(&self, text: &str) -> Result<SentimentResult> {
        let text = truncate_chars(text, self.max_chars);
        self.model.predict_with_score(&self.tokenizer, text)
    }

    /// Predict sentiment for a batch of inputs, one result per input.
    pub fn predict_batch(&self, texts: &[&str]) -> Vec<Result<SentimentResult>> {
        texts.iter().map(|text| self.predict(text)).collect()
    }

    /// Raw class probabilities, keyed by the checkpoint's label names.
    pub fn probabilities(&self, text: &str) -> Result<Vec<(String, f32)>> {
        let text = truncate_chars(text, self.max_chars);
        self.model.predict_probabilities(&self.tokenizer, text)
    }

    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}

impl<M> Classifier for SentimentAnalysisPipeline<M>
where
    M: SentimentAnalysisModel + Send + Sync,
{
    fn classify(&self, text: &str) -> Result<SentimentResult> {
        self.predict(text)
    }
}
