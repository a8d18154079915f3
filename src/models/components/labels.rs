use std::collections::HashMap;

use candle_core::{Tensor, D};
use candle_nn::ops::softmax;
use serde::Deserialize;

use crate::core::{Result, SentimentError};

/// Class names of a sequence-classification checkpoint, ordered by class id.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    /// Builds the ordered label list from a Hugging Face `id2label` map,
    /// whose keys are stringified integers.
    pub fn from_id2label(id2label: &HashMap<String, String>) -> Result<Self> {
        let mut indexed = id2label
            .iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|id| (id, label.clone()))
                    .map_err(|_| SentimentError::ModelLoad(format!("non-numeric class id '{id}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        indexed.sort_by_key(|(id, _)| *id);

        if indexed.is_empty() {
            return Err(SentimentError::ModelLoad("id2label is empty".into()));
        }
        if indexed.iter().enumerate().any(|(pos, (id, _))| pos != *id) {
            return Err(SentimentError::ModelLoad(
                "id2label ids are not contiguous from 0".into(),
            ));
        }

        Ok(Self {
            names: indexed.into_iter().map(|(_, label)| label).collect(),
        })
    }

    /// Reads `id2label` out of a raw `config.json`.
    pub fn from_config_json(config: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Raw {
            id2label: HashMap<String, String>,
        }
        let raw: Raw = serde_json::from_str(config)?;
        Self::from_id2label(&raw.id2label)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Softmaxes `(1, num_labels)` logits and pairs each probability with its
    /// class name.
    pub fn probabilities(&self, logits: &Tensor) -> Result<Vec<(String, f32)>> {
        let probs = softmax(&logits.squeeze(0)?, D::Minus1)?.to_vec1::<f32>()?;
        if probs.len() != self.names.len() {
            return Err(SentimentError::ModelLoad(format!(
                "classifier produced {} logits for {} labels",
                probs.len(),
                self.names.len()
            )));
        }
        Ok(self.names.iter().cloned().zip(probs).collect())
    }
}
