//! TextBlob-style pattern analyzer: averages per-word polarity after applying
//! intensifiers and negation.

use serde::Serialize;

use crate::core::{PolarityThresholds, Result};
use crate::models::lexicon::PatternLexicon;
use crate::pipelines::sentiment::{Classifier, SentimentResult};

const NEGATION_FACTOR: f32 = -0.5;

fn is_negation(word: &str) -> bool {
    matches!(word, "not" | "never" | "no") || word.ends_with("n't")
}

/// Mean polarity in `[-1, 1]` and subjectivity in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PatternScores {
    pub polarity: f32,
    pub subjectivity: f32,
}

#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    lexicon: PatternLexicon,
    thresholds: PolarityThresholds,
}

impl PatternAnalyzer {
    pub fn new(lexicon: PatternLexicon, thresholds: PolarityThresholds) -> Self {
        Self {
            lexicon,
            thresholds,
        }
    }

    pub fn with_thresholds(thresholds: PolarityThresholds) -> Result<Self> {
        Ok(Self::new(PatternLexicon::embedded()?, thresholds))
    }

    fn words(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|token| {
                let lower = token.to_lowercase();
                if self.lexicon.get(&lower).is_some() {
                    lower
                } else {
                    lower
                        .trim_matches(|c: char| c.is_ascii_punctuation() && c != '\'')
                        .to_string()
                }
            })
            .filter(|w| !w.is_empty())
            .collect()
    }

    pub fn scores(&self, text: &str) -> PatternScores {
        let words = self.words(text);
        let mut assessed: Vec<(f32, f32)> = Vec::new();
        let mut intensity: Option<f32> = None;
        let mut negated = false;

        for (idx, word) in words.iter().enumerate() {
            if is_negation(word) {
                negated = true;
                intensity = None;
                continue;
            }
            let Some(entry) = self.lexicon.get(word) else {
                intensity = None;
                continue;
            };

            // A modifier followed by another scored word only scales it.
            let modifies_next = entry.is_modifier()
                && words
                    .get(idx + 1)
                    .is_some_and(|next| self.lexicon.get(next).is_some());
            if modifies_next {
                intensity = Some(intensity.unwrap_or(1.0) * entry.intensity);
                continue;
            }

            let factor = intensity.take().unwrap_or(1.0);
            let mut polarity = entry.polarity * factor;
            let subjectivity = (entry.subjectivity * factor).min(1.0);
            if negated {
                polarity *= NEGATION_FACTOR;
                negated = false;
            }
            assessed.push((polarity, subjectivity));
        }

        if assessed.is_empty() {
            return PatternScores::default();
        }
        let n = assessed.len() as f32;
        PatternScores {
            polarity: (assessed.iter().map(|a| a.0).sum::<f32>() / n).clamp(-1.0, 1.0),
            subjectivity: (assessed.iter().map(|a| a.1).sum::<f32>() / n).clamp(0.0, 1.0),
        }
    }

    pub fn polarity(&self, text: &str) -> f32 {
        self.scores(text).polarity
    }

    pub fn subjectivity(&self, text: &str) -> f32 {
        self.scores(text).subjectivity
    }
}

impl Classifier for PatternAnalyzer {
    fn classify(&self, text: &str) -> Result<SentimentResult> {
        Ok(SentimentResult::from_polarity(
            self.polarity(text),
            &self.thresholds,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AnalysisConfig;
    use crate::pipelines::sentiment::Label;

    fn analyzer() -> PatternAnalyzer {
        PatternAnalyzer::with_thresholds(AnalysisConfig::default().thresholds.textblob).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn single_word_polarity() {
        let scores = analyzer().scores("The support was good.");
        assert!(close(scores.polarity, 0.7));
        assert!(close(scores.subjectivity, 0.6));
    }

    #[test]
    fn intensifier_scales_following_word() {
        assert!(close(analyzer().polarity("very good"), 0.91));
    }

    #[test]
    fn negation_halves_and_flips() {
        assert!(close(analyzer().polarity("not good"), -0.35));
        assert!(close(analyzer().polarity("it wasn't good"), -0.35));
    }

    #[test]
    fn polarity_is_mean_of_scored_words() {
        // good 0.7, terrible -1.0
        assert!(close(analyzer().polarity("good food, terrible service"), -0.15));
    }

    #[test]
    fn modifier_alone_is_scored() {
        assert!(close(analyzer().polarity("really"), 0.2));
    }

    #[test]
    fn labels_use_strict_thresholds() {
        let a = analyzer();
        assert_eq!(a.classify("excellent").unwrap().label, Label::Positive);
        assert_eq!(a.classify("awful").unwrap().label, Label::Negative);
        // professional = 0.1 is not strictly above 0.1
        assert_eq!(a.classify("professional").unwrap().label, Label::Neutral);
        assert_eq!(a.classify("").unwrap(), SentimentResult::from_polarity(0.0, &a.thresholds));
    }
}
