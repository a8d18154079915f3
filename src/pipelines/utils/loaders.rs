use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::Api as HfApi;
use hf_hub::{Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};

use crate::core::{ModelSource, Result, SentimentError};

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub revision: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, revision: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            revision: revision.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> Result<PathBuf> {
        let hf_api = HfApi::new()?;
        let hf_repo = hf_api.repo(Repo::with_revision(
            self.repo.clone(),
            RepoType::Model,
            self.revision.clone(),
        ));

        tracing::debug!(repo = %self.repo, file = %self.filename, "fetching from hub");
        Ok(hf_repo.get(self.filename.as_str())?)
    }
}

#[derive(Debug, Clone)]
pub struct TokenizerLoader {
    pub tokenizer_file_loader: HfLoader,
    pub max_length: Option<usize>,
}

impl TokenizerLoader {
    pub fn new(source: &ModelSource) -> Self {
        Self {
            tokenizer_file_loader: HfLoader::new(
                &source.tokenizer_id,
                &source.revision,
                "tokenizer.json",
            ),
            max_length: None,
        }
    }

    /// Truncate encodings to at most `max_length` tokens.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let tokenizer_file_path = self.tokenizer_file_loader.load()?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_file_path).map_err(|e| {
            SentimentError::ModelLoad(format!(
                "failed to load tokenizer {}: {e}",
                tokenizer_file_path.display()
            ))
        })?;

        // Padding is pointless for single-sequence inference.
        tokenizer.with_padding(None);
        if let Some(max_length) = self.max_length {
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length,
                    ..Default::default()
                }))
                .map_err(|e| SentimentError::ModelLoad(format!("invalid truncation: {e}")))?;
        }

        Ok(tokenizer)
    }
}

/// Local paths of everything needed to build a sequence classifier.
#[derive(Debug, Clone)]
pub struct ClassifierFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ClassifierLoader {
    pub source: ModelSource,
}

impl ClassifierLoader {
    pub fn new(source: &ModelSource) -> Self {
        Self {
            source: source.clone(),
        }
    }

    fn file(&self, filename: &str) -> HfLoader {
        HfLoader::new(&self.source.model_id, &self.source.revision, filename)
    }

    /// Fetch `config.json` and the weights, preferring safetensors over the
    /// pickled PyTorch checkpoint.
    pub fn load(&self) -> Result<ClassifierFiles> {
        let config = self.file("config.json").load()?;
        let weights = match self.file("model.safetensors").load() {
            Ok(safetensors) => safetensors,
            Err(_) => self.file("pytorch_model.bin").load().map_err(|e| {
                SentimentError::ModelLoad(format!(
                    "weights not found in {}; expected `model.safetensors` or `pytorch_model.bin`: {e}",
                    self.source.model_id
                ))
            })?,
        };

        Ok(ClassifierFiles { config, weights })
    }
}

/// Builds a [`VarBuilder`] over a safetensors or PyTorch weight file.
pub fn var_builder(weights: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let dtype = DType::F32;
    match weights.extension().and_then(|ext| ext.to_str()) {
        Some("safetensors") => {
            // SAFETY: the file is owned by the hub cache and not mutated while mapped.
            let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], dtype, device)? };
            Ok(vb)
        }
        Some("bin") => Ok(VarBuilder::from_pth(weights, dtype, device)?),
        _ => Err(SentimentError::ModelLoad(format!(
            "unsupported weight file format: {}",
            weights.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_weight_extension_is_rejected() {
        let err = var_builder(Path::new("/tmp/model.onnx"), &Device::Cpu).err().expect("expected an error");
        assert!(matches!(err, SentimentError::ModelLoad(_)));
    }

    #[test]
    fn tokenizer_loader_targets_tokenizer_repo() {
        let loader = TokenizerLoader::new(&ModelSource::roberta()).max_length(512);
        assert_eq!(loader.tokenizer_file_loader.repo, "FacebookAI/roberta-base");
        assert_eq!(loader.tokenizer_file_loader.filename, "tokenizer.json");
        assert_eq!(loader.max_length, Some(512));
    }
}
