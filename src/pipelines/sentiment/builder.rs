use super::model::SentimentAnalysisModel;
use super::pipeline::SentimentAnalysisPipeline;
use crate::core::{global_cache, ModelOptions, ModelSource, Result};
use crate::models::{DistilBertSentimentModel, RobertaSentimentModel};
use crate::pipelines::utils::{build_cache_key, DeviceRequest};

const DEFAULT_MAX_CHARS: usize = 500;

/// Builder for creating [`SentimentAnalysisPipeline`] instances.
///
/// Use [`Self::distilbert`] or [`Self::roberta`] as the entry point.
pub struct SentimentAnalysisPipelineBuilder<M: SentimentAnalysisModel> {
    options: M::Options,
    device_request: DeviceRequest,
    max_chars: usize,
}

impl<M: SentimentAnalysisModel> SentimentAnalysisPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn cpu(mut self) -> Self {
        self.device_request = DeviceRequest::Cpu;
        self
    }

    pub fn cuda_device(mut self, index: usize) -> Self {
        self.device_request = DeviceRequest::Cuda(index);
        self
    }

    pub fn device(mut self, device: candle_core::Device) -> Self {
        self.device_request = DeviceRequest::Explicit(device);
        self
    }

    pub fn device_request(mut self, request: DeviceRequest) -> Self {
        self.device_request = request;
        self
    }

    /// Texts longer than `max_chars` characters are cut before tokenization.
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    /// Builds the pipeline, reusing a cached model when one was already
    /// loaded for the same options and device.
    pub async fn build(self) -> Result<SentimentAnalysisPipeline<M>>
    where
        M: Clone + Send + Sync + 'static,
        M::Options: ModelOptions + Clone,
    {
        let device = self.device_request.resolve()?;
        let key = build_cache_key(&self.options, &device);
        let model = global_cache()
            .get_or_create(&key, || M::new(self.options.clone(), device.clone()))
            .await?;
        let tokenizer = M::get_tokenizer(self.options)?;
        Ok(SentimentAnalysisPipeline {
            model,
            tokenizer,
            max_chars: self.max_chars,
        })
    }
}

impl SentimentAnalysisPipelineBuilder<DistilBertSentimentModel> {
    /// DistilBERT fine-tuned on SST-2 (two classes).
    pub fn distilbert(source: ModelSource) -> Self {
        Self::new(source)
    }
}

impl SentimentAnalysisPipelineBuilder<RobertaSentimentModel> {
    /// RoBERTa fine-tuned on tweets (negative / neutral / positive).
    pub fn roberta(source: ModelSource) -> Self {
        Self::new(source)
    }
}
