//! Weighted vote across several classifiers.

use tracing::debug;

use crate::core::{Result, SentimentError};
use crate::pipelines::sentiment::{Classifier, Label, SentimentResult};

pub struct EnsembleMember {
    pub name: String,
    pub weight: f32,
    pub classifier: Box<dyn Classifier>,
}

impl EnsembleMember {
    pub fn new(name: impl Into<String>, weight: f32, classifier: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            weight,
            classifier,
        }
    }
}

impl std::fmt::Debug for EnsembleMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsembleMember")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// Each member votes for its label with `weight * confidence`; weights are
/// renormalised over the members that produced a result for the text.
///
/// The winning label's vote (capped at 1) is the confidence, and the score is
/// the weighted mean of member scores. Ties resolve in
/// Positive, Negative, Neutral order.
#[derive(Debug)]
pub struct EnsembleClassifier {
    members: Vec<EnsembleMember>,
}

impl EnsembleClassifier {
    pub fn new(members: Vec<EnsembleMember>) -> Result<Self> {
        if members.is_empty() {
            return Err(SentimentError::Config("ensemble needs at least one member".into()));
        }
        if let Some(bad) = members.iter().find(|m| !(m.weight > 0.0 && m.weight.is_finite())) {
            return Err(SentimentError::Config(format!(
                "ensemble weight for '{}' must be positive, got {}",
                bad.name, bad.weight
            )));
        }
        Ok(Self { members })
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }
}

impl Classifier for EnsembleClassifier {
    fn classify(&self, text: &str) -> Result<SentimentResult> {
        let votes: Vec<(f32, SentimentResult)> = self
            .members
            .iter()
            .filter_map(|member| match member.classifier.classify(text) {
                Ok(result) => Some((member.weight, result)),
                Err(e) => {
                    debug!(member = %member.name, error = %e, "ensemble member skipped");
                    None
                }
            })
            .collect();

        let total_weight: f32 = votes.iter().map(|(w, _)| w).sum();
        if votes.is_empty() || total_weight <= 0.0 {
            return Err(SentimentError::Classification(
                "no ensemble member produced a result".into(),
            ));
        }

        let mut tally = [0.0f32; 3];
        let mut score = 0.0f32;
        for (weight, result) in &votes {
            let weight = weight / total_weight;
            let slot = match result.label {
                Label::Positive => 0,
                Label::Negative => 1,
                Label::Neutral => 2,
            };
            tally[slot] += weight * result.confidence;
            score += weight * result.score;
        }

        let mut winner = 0;
        for slot in 1..tally.len() {
            if tally[slot] > tally[winner] {
                winner = slot;
            }
        }

        Ok(SentimentResult {
            label: Label::ALL[winner],
            score: score.clamp(-1.0, 1.0),
            confidence: tally[winner].clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always answers the same result, or fails when `None`.
    struct Fixed(Option<SentimentResult>);

    impl Classifier for Fixed {
        fn classify(&self, _text: &str) -> Result<SentimentResult> {
            self.0
                .ok_or_else(|| SentimentError::Tokenization("boom".into()))
        }
    }

    fn fixed(label: Label, score: f32, confidence: f32) -> Box<dyn Classifier> {
        Box::new(Fixed(Some(SentimentResult {
            label,
            score,
            confidence,
        })))
    }

    #[test]
    fn weighted_confidence_picks_label() {
        let ensemble = EnsembleClassifier::new(vec![
            EnsembleMember::new("a", 0.5, fixed(Label::Negative, -0.9, 0.9)),
            EnsembleMember::new("b", 0.25, fixed(Label::Positive, 0.6, 0.6)),
            EnsembleMember::new("c", 0.25, fixed(Label::Positive, 0.4, 0.4)),
        ])
        .unwrap();
        let result = ensemble.classify("x").unwrap();
        // Negative 0.45 vs Positive 0.25
        assert_eq!(result.label, Label::Negative);
        assert!((result.confidence - 0.45).abs() < 1e-6);
        assert!((result.score - (-0.45 + 0.15 + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn failing_members_are_renormalised_away() {
        let ensemble = EnsembleClassifier::new(vec![
            EnsembleMember::new(
                "broken",
                0.5,
                Box::new(Fixed(None)),
            ),
            EnsembleMember::new("ok", 0.25, fixed(Label::Positive, 0.8, 0.8)),
        ])
        .unwrap();
        let result = ensemble.classify("x").unwrap();
        assert_eq!(result.label, Label::Positive);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn all_members_failing_is_a_row_error() {
        let ensemble = EnsembleClassifier::new(vec![EnsembleMember::new(
            "broken",
            1.0,
            Box::new(Fixed(None)),
        )])
        .unwrap();
        let err = ensemble.classify("x").unwrap_err();
        assert!(!err.is_configuration());
    }

    #[test]
    fn rejects_empty_and_non_positive_weights() {
        assert!(EnsembleClassifier::new(vec![]).is_err());
        assert!(EnsembleClassifier::new(vec![EnsembleMember::new(
            "zero",
            0.0,
            fixed(Label::Neutral, 0.0, 1.0)
        )])
        .is_err());
    }
}
