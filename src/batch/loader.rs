//! Turns a [`ModelKind`] into a ready [`Classifier`].

use tracing::{info, warn};

use super::kind::ModelKind;
use crate::core::{AnalysisConfig, Result, SentimentError};
use crate::models::{
    DomainLexiconClassifier, EnsembleClassifier, EnsembleMember, PatternAnalyzer, PatternLexicon,
    VaderAnalyzer, VaderLexicon,
};
use crate::pipelines::sentiment::{Classifier, SentimentAnalysisPipelineBuilder};
use crate::pipelines::utils::DeviceRequest;

const ENSEMBLE_WEIGHTS: [f32; 4] = [0.5, 0.25, 0.15, 0.1];
const LEXICON_ENSEMBLE_WEIGHTS: [f32; 3] = [0.4, 0.3, 0.3];

/// A classifier together with the concrete model it resolved to.
pub struct LoadedClassifier {
    /// Never [`ModelKind::Auto`].
    pub kind: ModelKind,
    pub classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for LoadedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedClassifier")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

pub fn vader_analyzer(config: &AnalysisConfig) -> Result<VaderAnalyzer> {
    Ok(match &config.lexicons.vader {
        Some(path) => VaderAnalyzer::new(VaderLexicon::from_file(path)?, config.thresholds.vader),
        None => VaderAnalyzer::with_thresholds(config.thresholds.vader),
    })
}

pub fn pattern_analyzer(config: &AnalysisConfig) -> Result<PatternAnalyzer> {
    let lexicon = match &config.lexicons.pattern {
        Some(path) => PatternLexicon::from_file(path)?,
        None => PatternLexicon::embedded()?,
    };
    Ok(PatternAnalyzer::new(lexicon, config.thresholds.textblob))
}

async fn load_distilbert(
    config: &AnalysisConfig,
    device: &DeviceRequest,
) -> Result<Box<dyn Classifier>> {
    let pipeline = SentimentAnalysisPipelineBuilder::distilbert(config.models.distilbert.clone())
        .device_request(device.clone())
        .max_chars(config.max_chars)
        .build()
        .await?;
    Ok(Box::new(pipeline))
}

async fn load_roberta(
    config: &AnalysisConfig,
    device: &DeviceRequest,
) -> Result<Box<dyn Classifier>> {
    let pipeline = SentimentAnalysisPipelineBuilder::roberta(config.models.roberta.clone())
        .device_request(device.clone())
        .max_chars(config.max_chars)
        .build()
        .await?;
    Ok(Box::new(pipeline))
}

async fn load_single(
    kind: ModelKind,
    config: &AnalysisConfig,
    device: &DeviceRequest,
) -> Result<Box<dyn Classifier>> {
    let classifier: Box<dyn Classifier> = match kind {
        ModelKind::TextBlob => Box::new(pattern_analyzer(config)?),
        ModelKind::Vader => Box::new(vader_analyzer(config)?),
        ModelKind::DistilBert => load_distilbert(config, device).await?,
        ModelKind::Roberta => load_roberta(config, device).await?,
        ModelKind::Ensemble => Box::new(load_ensemble(config, device).await?),
        ModelKind::Auto => {
            return Err(SentimentError::Config(
                "auto must be resolved before loading".into(),
            ))
        }
    };
    Ok(classifier)
}

fn lexicon_members(config: &AnalysisConfig, weights: [f32; 3]) -> Result<Vec<EnsembleMember>> {
    Ok(vec![
        EnsembleMember::new("vader", weights[0], Box::new(vader_analyzer(config)?)),
        EnsembleMember::new("domain", weights[1], Box::new(DomainLexiconClassifier::new())),
        EnsembleMember::new("textblob", weights[2], Box::new(pattern_analyzer(config)?)),
    ])
}

/// The ensemble without its transformer member: VADER, the support-desk
/// lexicon and TextBlob weighted 0.4/0.3/0.3.
pub fn lexicon_ensemble(config: &AnalysisConfig) -> Result<EnsembleClassifier> {
    EnsembleClassifier::new(lexicon_members(config, LEXICON_ENSEMBLE_WEIGHTS)?)
}

async fn load_ensemble(
    config: &AnalysisConfig,
    device: &DeviceRequest,
) -> Result<EnsembleClassifier> {
    let roberta = match load_roberta(config, device).await {
        Ok(classifier) => classifier,
        Err(e) => {
            warn!(error = %e, "RoBERTa unavailable, ensemble continues with lexicon members");
            return lexicon_ensemble(config);
        }
    };

    let [transformer, vader, domain, textblob] = ENSEMBLE_WEIGHTS;
    let mut members = vec![EnsembleMember::new("roberta", transformer, roberta)];
    members.extend(lexicon_members(config, [vader, domain, textblob])?);
    EnsembleClassifier::new(members)
}

/// Loads the classifier for `kind`. Configuration problems (bad lexicon
/// file, model download failure) are returned before any text is seen;
/// `Auto` only fails when every candidate does.
pub async fn load_classifier(
    kind: ModelKind,
    config: &AnalysisConfig,
    device: DeviceRequest,
) -> Result<LoadedClassifier> {
    if kind != ModelKind::Auto {
        let classifier = load_single(kind, config, &device).await?;
        info!(model = %kind, "classifier ready");
        return Ok(LoadedClassifier { kind, classifier });
    }

    let mut last_error = None;
    for candidate in ModelKind::AUTO_ORDER {
        match load_single(candidate, config, &device).await {
            Ok(classifier) => {
                info!(model = %candidate, "auto-selected classifier");
                return Ok(LoadedClassifier {
                    kind: candidate,
                    classifier,
                });
            }
            Err(e) => {
                warn!(model = %candidate, error = %e, "auto-selection skipped model");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| SentimentError::ModelLoad("no model available".into())))
}

/// Parses `selector` and loads it; an unknown name fails before any loading.
pub async fn load_classifier_by_name(
    selector: &str,
    config: &AnalysisConfig,
    device: DeviceRequest,
) -> Result<LoadedClassifier> {
    let kind: ModelKind = selector.parse()?;
    load_classifier(kind, config, device).await
}
