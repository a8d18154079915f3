use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::kind::ModelKind;
use crate::pipelines::sentiment::{Label, SentimentResult};

/// Rows above this confidence count as high-confidence in the report.
pub const HIGH_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl LabelCounts {
    pub fn get(&self, label: Label) -> usize {
        match label {
            Label::Positive => self.positive,
            Label::Negative => self.negative,
            Label::Neutral => self.neutral,
        }
    }

    fn record(&mut self, label: Label) {
        match label {
            Label::Positive => self.positive += 1,
            Label::Negative => self.negative += 1,
            Label::Neutral => self.neutral += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

fn as_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Aggregate statistics for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRun {
    pub model: ModelKind,
    pub total: usize,
    pub counts: LabelCounts,
    /// Rows whose classification failed and were defaulted to Neutral.
    pub failed: usize,
    pub high_confidence: usize,
    pub mean_confidence: f32,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl AnalysisRun {
    pub fn from_results(
        model: ModelKind,
        results: &[SentimentResult],
        failed: usize,
        elapsed: Duration,
    ) -> Self {
        let mut counts = LabelCounts::default();
        let mut confidence_sum = 0.0f64;
        let mut high_confidence = 0;
        for result in results {
            counts.record(result.label);
            confidence_sum += f64::from(result.confidence);
            if result.confidence > HIGH_CONFIDENCE {
                high_confidence += 1;
            }
        }

        let mean_confidence = if results.is_empty() {
            0.0
        } else {
            (confidence_sum / results.len() as f64) as f32
        };

        Self {
            model,
            total: results.len(),
            counts,
            failed,
            high_confidence,
            mean_confidence,
            elapsed,
        }
    }

    /// Share of rows with `label`, in percent; 0 for an empty run.
    pub fn percentage(&self, label: Label) -> f32 {
        percent(self.counts.get(label), self.total)
    }

    pub fn rows_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total as f64 / secs
        } else {
            0.0
        }
    }
}

fn percent(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 * 100.0 / total as f32
    }
}

impl fmt::Display for AnalysisRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {} ({})", self.model.info().display_name, self.model)?;
        writeln!(f, "Rows analysed: {}", self.total)?;
        for label in Label::ALL {
            writeln!(
                f,
                "  {:<9} {:>6} ({:.1}%)",
                label.as_str(),
                self.counts.get(label),
                self.percentage(label)
            )?;
        }
        writeln!(f, "Average confidence: {:.3}", self.mean_confidence)?;
        writeln!(
            f,
            "High confidence (>{HIGH_CONFIDENCE}): {} ({:.1}%)",
            self.high_confidence,
            percent(self.high_confidence, self.total)
        )?;
        if self.failed > 0 {
            writeln!(f, "Failed rows (defaulted to Neutral): {}", self.failed)?;
        }
        write!(
            f,
            "Elapsed: {:.2}s ({:.1} rows/s)",
            self.elapsed.as_secs_f64(),
            self.rows_per_second()
        )
    }
}
