//! Customer-service vocabulary vote.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::core::Result;
use crate::pipelines::sentiment::{Classifier, Label, SentimentResult};

static POSITIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "professional", "helpful", "courteous", "patient", "knowledgeable", "efficient", "quick",
        "responsive", "thorough", "excellent", "resolved", "solved", "fixed", "helped", "assisted",
        "guided", "explained", "clarified", "understood", "satisfied", "thank", "appreciate",
        "grateful", "pleased", "happy", "recommend", "impressed", "outstanding", "amazing",
        "perfect",
    ])
});

static NEGATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "unprofessional", "rude", "impatient", "unhelpful", "slow", "confusing", "unclear",
        "difficult", "complicated", "frustrated", "unresolved", "unsolved", "failed", "unable",
        "refused", "ignored", "dismissed", "hung up", "transferred", "waiting", "disappointed",
        "angry", "upset", "annoyed", "complain", "terrible", "awful", "worst", "horrible",
        "disgusted",
    ])
});

/// Counts hits against fixed positive and negative support-desk word sets.
/// The majority wins with its share of hits as confidence; no hits or a tie
/// is `Neutral` at 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainLexiconClassifier;

impl DomainLexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    /// `(positive hits, negative hits)`.
    pub fn counts(&self, text: &str) -> (usize, usize) {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| c.is_ascii_punctuation())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let mut positive = 0;
        let mut negative = 0;
        for (idx, word) in words.iter().enumerate() {
            if POSITIVE.contains(word.as_str()) {
                positive += 1;
            } else if NEGATIVE.contains(word.as_str()) {
                negative += 1;
            }
            if let Some(next) = words.get(idx + 1) {
                if NEGATIVE.contains(format!("{word} {next}").as_str()) {
                    negative += 1;
                }
            }
        }
        (positive, negative)
    }
}

impl Classifier for DomainLexiconClassifier {
    fn classify(&self, text: &str) -> Result<SentimentResult> {
        let (positive, negative) = self.counts(text);
        let total = positive + negative;
        if total == 0 || positive == negative {
            return Ok(SentimentResult {
                label: Label::Neutral,
                score: 0.0,
                confidence: 0.5,
            });
        }

        let total = total as f32;
        let (label, majority) = if positive > negative {
            (Label::Positive, positive)
        } else {
            (Label::Negative, negative)
        };
        Ok(SentimentResult {
            label,
            score: (positive as f32 - negative as f32) / total,
            confidence: majority as f32 / total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_share_is_confidence() {
        let result = DomainLexiconClassifier
            .classify("Agent was patient and helpful, but I was transferred twice.")
            .unwrap();
        assert_eq!(result.label, Label::Positive);
        assert!((result.confidence - 2.0 / 3.0).abs() < 1e-6);
        assert!((result.score - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn phrases_count_as_one_hit() {
        assert_eq!(DomainLexiconClassifier.counts("They hung up on me"), (0, 1));
    }

    #[test]
    fn ties_and_misses_are_neutral_half() {
        for text in ["quick but rude", "the invoice arrived"] {
            let result = DomainLexiconClassifier.classify(text).unwrap();
            assert_eq!(result.label, Label::Neutral);
            assert_eq!(result.confidence, 0.5);
            assert_eq!(result.score, 0.0);
        }
    }
}
