//! RoBERTa sequence classifier.
//!
//! BERT-style post-LayerNorm encoder whose position ids start after the
//! padding index, topped by the `dense -> tanh -> out_proj` head on `<s>`.
//! Weight names follow Hugging Face's `RobertaForSequenceClassification`.

use candle_core::{DType, Device, IndexOp, Result, Tensor};
use candle_nn::{embedding, layer_norm, linear, Embedding, LayerNorm, Linear, Module, VarBuilder};
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::core::{ModelSource, Result as CoreResult};
use crate::models::components::{attention_bias, encode, ClassLabels, FeedForward, SelfAttention};
use crate::pipelines::sentiment::SentimentAnalysisModel;
use crate::pipelines::utils::loaders::{var_builder, ClassifierLoader, TokenizerLoader};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_pad_token_id")]
    pub pad_token_id: u32,
}

fn default_type_vocab_size() -> usize {
    1
}

fn default_layer_norm_eps() -> f64 {
    1e-5
}

fn default_pad_token_id() -> u32 {
    1
}

impl Config {
    /// Longest sequence the position table can hold.
    pub fn max_tokens(&self) -> usize {
        self.max_position_embeddings
            .saturating_sub(self.pad_token_id as usize + 1)
    }
}

/// Position ids as RoBERTa computes them: real tokens count up from
/// `pad_token_id + 1`, padding tokens keep `pad_token_id`.
pub fn position_ids(ids: &[u32], pad_token_id: u32) -> Vec<u32> {
    let mut next = pad_token_id;
    ids.iter()
        .map(|&id| {
            if id == pad_token_id {
                pad_token_id
            } else {
                next += 1;
                next
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
    pad_token_id: u32,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            word_embeddings: embedding(config.vocab_size, hidden, vb.pp("word_embeddings"))?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                hidden,
                vb.pp("position_embeddings"),
            )?,
            token_type_embeddings: embedding(
                config.type_vocab_size,
                hidden,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm(hidden, config.layer_norm_eps, vb.pp("LayerNorm"))?,
            pad_token_id: config.pad_token_id,
        })
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let (batch, seq_len) = input_ids.dims2()?;
        let positions = input_ids
            .to_vec2::<u32>()?
            .iter()
            .flat_map(|row| position_ids(row, self.pad_token_id))
            .collect::<Vec<_>>();
        let positions = Tensor::from_vec(positions, (batch, seq_len), input_ids.device())?;
        let token_types = input_ids.zeros_like()?;

        let words = self.word_embeddings.forward(input_ids)?;
        let positions = self.position_embeddings.forward(&positions)?;
        let token_types = self.token_type_embeddings.forward(&token_types)?;

        ((words + positions)? + token_types)?.apply(&self.layer_norm)
    }
}

#[derive(Debug, Clone)]
struct EncoderLayer {
    attention: SelfAttention,
    attention_norm: LayerNorm,
    ffn: FeedForward,
    output_norm: LayerNorm,
}

impl EncoderLayer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let hidden = config.hidden_size;
        let eps = config.layer_norm_eps;
        let attn = vb.pp("attention");
        let attention = SelfAttention::new(
            linear(hidden, hidden, attn.pp("self.query"))?,
            linear(hidden, hidden, attn.pp("self.key"))?,
            linear(hidden, hidden, attn.pp("self.value"))?,
            linear(hidden, hidden, attn.pp("output.dense"))?,
            hidden,
            config.num_attention_heads,
        );
        let ffn = FeedForward::new(
            linear(hidden, config.intermediate_size, vb.pp("intermediate.dense"))?,
            linear(config.intermediate_size, hidden, vb.pp("output.dense"))?,
        );

        Ok(Self {
            attention,
            attention_norm: layer_norm(hidden, eps, attn.pp("output.LayerNorm"))?,
            ffn,
            output_norm: layer_norm(hidden, eps, vb.pp("output.LayerNorm"))?,
        })
    }

    fn forward(&self, hidden_states: &Tensor, bias: &Tensor) -> Result<Tensor> {
        let attended = self.attention.forward(hidden_states, bias)?;
        let hidden_states = (attended + hidden_states)?.apply(&self.attention_norm)?;

        let ffn_out = hidden_states.apply(&self.ffn)?;
        (ffn_out + hidden_states)?.apply(&self.output_norm)
    }
}

#[derive(Debug, Clone)]
struct ClassificationHead {
    dense: Linear,
    out_proj: Linear,
}

impl ClassificationHead {
    fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        Ok(Self {
            dense: linear(config.hidden_size, config.hidden_size, vb.pp("dense"))?,
            out_proj: linear(config.hidden_size, num_labels, vb.pp("out_proj"))?,
        })
    }

    fn forward(&self, hidden_states: &Tensor) -> Result<Tensor> {
        hidden_states
            .i((.., 0))?
            .apply(&self.dense)?
            .tanh()?
            .apply(&self.out_proj)
    }
}

/// RoBERTa encoder with its sequence-classification head.
#[derive(Debug, Clone)]
pub struct RobertaForSequenceClassification {
    embeddings: Embeddings,
    layers: Vec<EncoderLayer>,
    head: ClassificationHead,
}

impl RobertaForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config, num_labels: usize) -> Result<Self> {
        let base = vb.pp("roberta");
        let embeddings = Embeddings::load(base.pp("embeddings"), config)?;
        let layers = (0..config.num_hidden_layers)
            .map(|i| EncoderLayer::load(base.pp(format!("encoder.layer.{i}")), config))
            .collect::<Result<Vec<_>>>()?;
        let head = ClassificationHead::load(vb.pp("classifier"), config, num_labels)?;

        Ok(Self {
            embeddings,
            layers,
            head,
        })
    }

    /// Returns `(batch, num_labels)` logits.
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let bias = attention_bias(attention_mask, DType::F32)?;
        let mut hidden_states = self.embeddings.forward(input_ids)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &bias)?;
        }
        self.head.forward(&hidden_states)
    }
}

/// Sentiment model backed by the Twitter-tuned RoBERTa checkpoint.
#[derive(Clone)]
pub struct RobertaSentimentModel {
    model: RobertaForSequenceClassification,
    labels: ClassLabels,
    device: Device,
}

impl RobertaSentimentModel {
    pub fn load(source: &ModelSource, device: Device) -> CoreResult<Self> {
        let files = ClassifierLoader::new(source).load()?;
        let config_content = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&config_content)?;
        let labels = ClassLabels::from_config_json(&config_content)?;

        let vb = var_builder(&files.weights, &device)?;
        let model = RobertaForSequenceClassification::load(vb, &config, labels.len())?;

        tracing::info!(
            model = %source.model_id,
            layers = config.num_hidden_layers,
            labels = ?labels.names(),
            "loaded RoBERTa classifier"
        );

        Ok(Self {
            model,
            labels,
            device,
        })
    }
}

impl SentimentAnalysisModel for RobertaSentimentModel {
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
        // 514 position slots minus the two reserved by the padding offset.
        TokenizerLoader::new(&options).max_length(512).load()
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    #[test]
    fn positions_skip_padding_offset() {
        assert_eq!(position_ids(&[0, 713, 16, 2], 1), vec![2, 3, 4, 5]);
        assert_eq!(position_ids(&[0, 713, 2, 1, 1], 1), vec![2, 3, 4, 1, 1]);
    }

    #[test]
    fn config_defaults_match_roberta_base() {
        let config: Config = serde_json::from_str(
            r#"{
                "vocab_size": 50265, "hidden_size": 768, "num_hidden_layers": 12,
                "num_attention_heads": 12, "intermediate_size": 3072,
                "max_position_embeddings": 514,
                "id2label": {"0": "negative", "1": "neutral", "2": "positive"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.pad_token_id, 1);
        assert_eq!(config.type_vocab_size, 1);
        assert_eq!(config.max_tokens(), 512);
    }

    #[test]
    fn randomly_initialised_model_yields_three_logits() {
        let config = Config {
            vocab_size: 16,
            hidden_size: 8,
            num_hidden_layers: 1,
            num_attention_heads: 2,
            intermediate_size: 16,
            max_position_embeddings: 20,
            type_vocab_size: 1,
            layer_norm_eps: 1e-5,
            pad_token_id: 1,
        };
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = RobertaForSequenceClassification::load(vb, &config, 3).unwrap();

        let input_ids = Tensor::new(&[[0u32, 9, 4, 2]], &Device::Cpu).unwrap();
        let mask = Tensor::ones((1, 4), DType::U32, &Device::Cpu).unwrap();
        let logits = model.forward(&input_ids, &mask).unwrap();
        assert_eq!(logits.dims(), &[1, 3]);
    }
}
