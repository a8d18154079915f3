pub mod distilbert;
pub mod domain;
pub mod ensemble;
pub mod pattern;
pub mod roberta;
pub mod vader;

pub use distilbert::DistilBertSentimentModel;
pub use domain::DomainLexiconClassifier;
pub use ensemble::{EnsembleClassifier, EnsembleMember};
pub use pattern::{PatternAnalyzer, PatternScores};
pub use roberta::RobertaSentimentModel;
pub use vader::{VaderAnalyzer, VaderScores};
