//! Classifier implementations.
//!
//! Transformer checkpoints live next to the rule-based lexicon scorers so the
//! batch layer can treat them uniformly through
//! [`Classifier`](crate::pipelines::sentiment::Classifier).

pub mod components;
pub mod implementations;
pub mod lexicon;

pub use implementations::{
    DistilBertSentimentModel, DomainLexiconClassifier, EnsembleClassifier, EnsembleMember,
    PatternAnalyzer, PatternScores, RobertaSentimentModel, VaderAnalyzer, VaderScores,
};
pub use lexicon::{PatternEntry, PatternLexicon, VaderLexicon};
