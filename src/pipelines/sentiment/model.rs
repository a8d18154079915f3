use tokenizers::Tokenizer;

use super::pipeline::SentimentResult;
use crate::core::Result;

/// Anything that can turn a piece of text into a [`SentimentResult`].
///
/// Lexicon scorers implement this directly; transformer checkpoints get it
/// through [`SentimentAnalysisPipeline`](super::SentimentAnalysisPipeline).
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<SentimentResult>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, text: &str) -> Result<SentimentResult> {
        (**self).classify(text)
    }
}

pub trait SentimentAnalysisModel {
    type Options: std::fmt::Debug + Clone;

    fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    /// Softmax distribution over the checkpoint's classes, keyed by its
    /// `id2label` names.
    fn predict_probabilities(&self, tokenizer: &Tokenizer, text: &str)
        -> Result<Vec<(String, f32)>>;

    /// Name of the most probable class.
    fn predict(&self, tokenizer: &Tokenizer, text: &str) -> Result<String> {
        let probabilities = self.predict_probabilities(tokenizer, text)?;
        Ok(probabilities
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(label, _)| label)
            .unwrap_or_default())
    }

    /// Predict sentiment and return label, signed score and confidence.
    fn predict_with_score(&self, tokenizer: &Tokenizer, text: &str) -> Result<SentimentResult> {
        let probabilities = self.predict_probabilities(tokenizer, text)?;
        Ok(SentimentResult::from_probabilities(&probabilities))
    }

    fn get_tokenizer(options: Self::Options) -> Result<Tokenizer>;

    fn device(&self) -> &candle_core::Device;
}
