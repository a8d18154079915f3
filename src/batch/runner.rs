use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::kind::ModelKind;
use super::loader::{load_classifier_by_name, LoadedClassifier};
use super::summary::AnalysisRun;
use crate::core::{AnalysisConfig, Result};
use crate::pipelines::sentiment::{Classifier, SentimentResult};
use crate::pipelines::utils::DeviceRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// Per-row results, index-aligned with the input cells, plus the run summary.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub results: Vec<SentimentResult>,
    pub run: AnalysisRun,
}

/// Runs one classifier over a column of cells, one row at a time.
pub struct BatchRunner {
    model: ModelKind,
    classifier: Box<dyn Classifier>,
    progress_interval: usize,
    min_text_chars: usize,
}

impl BatchRunner {
    pub fn new(model: ModelKind, classifier: Box<dyn Classifier>, config: &AnalysisConfig) -> Self {
        Self {
            model,
            classifier,
            progress_interval: config.progress_interval.max(1),
            min_text_chars: config.min_text_chars,
        }
    }

    pub fn from_loaded(loaded: LoadedClassifier, config: &AnalysisConfig) -> Self {
        Self::new(loaded.kind, loaded.classifier, config)
    }

    /// Validates `selector` and loads its classifier.
    pub async fn for_selector(
        selector: &str,
        config: &AnalysisConfig,
        device: DeviceRequest,
    ) -> Result<Self> {
        let loaded = load_classifier_by_name(selector, config, device).await?;
        Ok(Self::from_loaded(loaded, config))
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    fn text_of<'a>(&self, cell: Option<&'a str>) -> Option<&'a str> {
        let text = cell?.trim();
        if text.is_empty() || text.chars().count() < self.min_text_chars {
            None
        } else {
            Some(text)
        }
    }

    /// Classifies every cell. Missing or blank cells yield the neutral default;
    /// a row whose classification fails is logged and defaulted the same way.
    pub fn run<F>(&self, cells: &[Option<&str>], mut on_progress: F) -> BatchOutput
    where
        F: FnMut(Progress),
    {
        let started = Instant::now();
        let total = cells.len();
        let mut results = Vec::with_capacity(total);
        let mut failed = 0;

        info!(model = %self.model, rows = total, "starting batch");

        if total == 0 {
            on_progress(Progress {
                completed: 0,
                total: 0,
            });
        }

        for (row, cell) in cells.iter().enumerate() {
            let result = match self.text_of(*cell) {
                None => SentimentResult::neutral(),
                Some(text) => match self.classifier.classify(text) {
                    Ok(result) => sanitize(result),
                    Err(e) => {
                        warn!(row, error = %e, "classification failed, defaulting to Neutral");
                        failed += 1;
                        SentimentResult::neutral()
                    }
                },
            };
            results.push(result);

            let completed = row + 1;
            if completed % self.progress_interval == 0 || completed == total {
                debug!(completed, total, "progress");
                on_progress(Progress { completed, total });
            }
        }

        let run = AnalysisRun::from_results(self.model, &results, failed, started.elapsed());
        info!(
            model = %self.model,
            rows = run.total,
            positive = run.counts.positive,
            negative = run.counts.negative,
            neutral = run.counts.neutral,
            failed = run.failed,
            "batch finished"
        );
        BatchOutput { results, run }
    }
}

/// Keeps the `[-1, 1]` score and `[0, 1]` confidence ranges even if a
/// classifier misbehaves.
fn sanitize(mut result: SentimentResult) -> SentimentResult {
    result.score = if result.score.is_finite() {
        result.score.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    result.confidence = if result.confidence.is_finite() {
        result.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SentimentError;
    use crate::pipelines::sentiment::Label;

    /// Positive for anything, except texts containing "boom" which fail.
    struct Scripted;

    impl Classifier for Scripted {
        fn classify(&self, text: &str) -> Result<SentimentResult> {
            if text.contains("boom") {
                return Err(SentimentError::Tokenization("boom".into()));
            }
            Ok(SentimentResult {
                label: Label::Positive,
                score: 2.0,
                confidence: f32::NAN,
            })
        }
    }

    fn runner(interval: usize) -> BatchRunner {
        let config = AnalysisConfig {
            progress_interval: interval,
            ..AnalysisConfig::default()
        };
        BatchRunner::new(ModelKind::Vader, Box::new(Scripted), &config)
    }

    #[test]
    fn failures_and_blanks_default_to_neutral() {
        let cells = [Some("fine"), None, Some("   "), Some("boom"), Some("ok")];
        let output = runner(1).run(&cells, |_| {});

        assert_eq!(output.results.len(), cells.len());
        assert_eq!(output.results[1], SentimentResult::neutral());
        assert_eq!(output.results[2], SentimentResult::neutral());
        assert_eq!(output.results[3], SentimentResult::neutral());
        assert_eq!(output.run.failed, 1);
        assert_eq!(output.run.counts.positive, 2);
    }

    #[test]
    fn misbehaving_scores_are_clamped() {
        let output = runner(1).run(&[Some("fine")], |_| {});
        assert_eq!(output.results[0].score, 1.0);
        assert_eq!(output.results[0].confidence, 0.0);
    }

    #[test]
    fn progress_every_interval_and_at_end() {
        let cells = vec![Some("x"); 7];
        let mut seen = Vec::new();
        runner(3).run(&cells, |p| seen.push(p.completed));
        assert_eq!(seen, vec![3, 6, 7]);
    }

    #[test]
    fn empty_batch_reports_once() {
        let mut seen = Vec::new();
        let output = runner(1).run(&[], |p| seen.push(p));
        assert!(output.results.is_empty());
        assert_eq!(
            seen,
            vec![Progress {
                completed: 0,
                total: 0
            }]
        );
    }

    #[test]
    fn short_cells_respect_min_text_chars() {
        let config = AnalysisConfig {
            min_text_chars: 3,
            ..AnalysisConfig::default()
        };
        let runner = BatchRunner::new(ModelKind::Vader, Box::new(Scripted), &config);
        let output = runner.run(&[Some("ok"), Some("okay")], |_| {});
        assert_eq!(output.results[0].label, Label::Neutral);
        assert_eq!(output.results[1].label, Label::Positive);
    }
}
