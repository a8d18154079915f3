//! DistilBERT sequence classifier.
//!
//! Six post-LayerNorm encoder blocks over learned position embeddings, with
//! the `pre_classifier -> ReLU -> classifier` head applied to the `[CLS]`
//! token. Checkpoint layout follows Hugging Face's
//! `DistilBertForSequenceClassification`.

use candle_core::{DType, Device, IndexOp, Result, Tensor};
use candle_nn::{embedding, layer_norm, linear, Embedding, LayerNorm, Linear, Module, VarBuilder};
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::core::{ModelSource, Result as CoreResult};
use crate::models::components::{attention_bias, encode, ClassLabels, FeedForward, SelfAttention};
use crate::pipelines::sentiment::SentimentAnalysisModel;
use crate::pipelines::utils::loaders::{var_builder, ClassifierLoader, TokenizerLoader};

const LAYER_NORM_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub dim: usize,
    pub n_layers: usize,
    pub n_heads: usize,
    pub hidden_dim: usize,
    pub max_position_embeddings: usize,
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        Ok(Self {
            word_embeddings: embedding(config.vocab_size, config.dim, vb.pp("word_embeddings"))?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                config.dim,
                vb.pp("position_embeddings"),
            )?,
            layer_norm: layer_norm(config.dim, LAYER_NORM_EPS, vb.pp("LayerNorm"))?,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let (_, seq_len) = input_ids.dims2()?;
        let positions = Tensor::arange(0u32, seq_len as u32, input_ids.device())?.unsqueeze(0)?;

        let words = self.word_embeddings.forward(input_ids)?;
        let positions = self.position_embeddings.forward(&positions)?;
        words.broadcast_add(&positions)?.apply(&self.layer_norm)
    }
}

#[derive(Debug, Clone)]
struct TransformerBlock {
    attention: SelfAttention,
    sa_layer_norm: LayerNorm,
    ffn: FeedForward,
    output_layer_norm: LayerNorm,
}

impl TransformerBlock {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let dim = config.dim;
        let attn = vb.pp("attention");
        let attention = SelfAttention::new(
            linear(dim, dim, attn.pp("q_lin"))?,
            linear(dim, dim, attn.pp("k_lin"))?,
            linear(dim, dim, attn.pp("v_lin"))?,
            linear(dim, dim, attn.pp("out_lin"))?,
            dim,
            config.n_heads,
        );
        let ffn = FeedForward::new(
            linear(dim, config.hidden_dim, vb.pp("ffn.lin1"))?,
            linear(config.hidden_dim, dim, vb.pp("ffn.lin2"))?,
        );

        Ok(Self {
            attention,
            sa_layer_norm: layer_norm(dim, LAYER_NORM_EPS, vb.pp("sa_layer_norm"))?,
            ffn,
            output_layer_norm: layer_norm(dim, LAYER_NORM_EPS, vb.pp("output_layer_norm"))?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, bias: &Tensor) -> Result<Tensor> {
        let attended = self.attention.forward(hidden_states, bias)?;
        let hidden_states = (attended + hidden_states)?.apply(&self.sa_layer_norm)?;

        let ffn_out = hidden_states.apply(&self.ffn)?;
        (ffn_out + hidden_states)?.apply(&self.output_layer_norm)
    }
}

/// DistilBERT encoder with its sequence-classification head.
#[derive(Debug, Clone)]
pub struct DistilBertForSequenceClassification {
    embeddings: Embeddings,
    layers: Vec<TransformerBlock>,
    pre_classifier: Linear,
    classifier: Linear,
}

impl DistilBertForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let base = vb.pp("distilbert");
        let embeddings = Embeddings::load(base.pp("embeddings"), config)?;
        let layers = (0..config.n_layers)
            .map(|i| TransformerBlock::load(base.pp(format!("transformer.layer.{i}")), config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            embeddings,
            layers,
            pre_classifier: linear(config.dim, config.dim, vb.pp("pre_classifier"))?,
            classifier: linear(config.dim, num_labels, vb.pp("classifier"))?,
        })
    }

    /// Returns `(batch, num_labels)` logits.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let bias = attention_bias(attention_mask, DType::F32)?;
        let mut hidden_states = self.embeddings.forward(input_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &bias)?;
        }

        hidden_states
            .i((.., 0))?
            .apply(&self.pre_classifier)?
            .relu()?
            .apply(&self.classifier)
    }
}

/// Sentiment model backed by a DistilBERT SST-2 checkpoint.
#[derive(Clone)]
pub struct DistilBertSentimentModel {
    model: DistilBertForSequenceClassification,
    labels: ClassLabels,
    device: Device,
}

impl DistilBertSentimentModel {
    pub fn load(source: &ModelSource, device: Device) -> CoreResult<Self> {
        let files = ClassifierLoader::new(source).load()?;
        let config_content = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&config_content)?;
        let labels = ClassLabels::from_config_json(&config_content)?;

        let vb = var_builder(&files.weights, &device)?;
        let model = DistilBertForSequenceClassification::load(vb, &config, labels.len())?;

        tracing::info!(
            model = %source.model_id,
            layers = config.n_layers,
            labels = ?labels.names(),
            "loaded DistilBERT classifier"
        );

        Ok(Self {
            model,
            labels,
            device,
        })
    }
}

impl SentimentAnalysisModel for DistilBertSentimentModel {
    type Options = ModelSource;

    fn new(options: Self::Options, device: Device) -> CoreResult<Self> {
        Self::load(&options, device)
    }

    fn predict_probabilities(
        &self,
        tokenizer: &Tokenizer,
        text: &str,
    ) -> CoreResult<Vec<(String, f32)>> {
        let encoded = encode(tokenizer, text, &self.device)?;
        let logits = self
            .model
            .forward(&encoded.input_ids, &encoded.attention_mask)?;
        self.labels.probabilities(&logits)
    }

    fn get_tokenizer(options: Self::Options) -> CoreResult<Tokenizer> {
        TokenizerLoader::new(&options).max_length(512).load()
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
