use candle_core::{DType, Result, Tensor, D};
use candle_nn::{ops::softmax, Linear, Module};

/// Additive mask value for padded positions.
const MASKED: f64 = f32::MIN as f64;

/// Turns a `(batch, seq)` 0/1 attention mask into a `(batch, 1, 1, seq)`
/// additive bias: kept positions contribute 0, padded ones a large negative.
pub fn attention_bias(attention_mask: &Tensor, dtype: DType) -> Result<Tensor> {
    let mask = attention_mask.to_dtype(dtype)?;
    let inverted = (mask.ones_like()? - &mask)?;
    inverted.affine(MASKED, 0.0)?.unsqueeze(1)?.unsqueeze(1)
}

/// Bidirectional multi-head self-attention with separate Q/K/V projections,
/// as used by the BERT family.
#[derive(Debug, Clone)]
pub struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    num_heads: usize,
    head_dim: usize,
}

impl SelfAttention {
    pub fn new(
        query: Linear,
        key: Linear,
        value: Linear,
        output: Linear,
        hidden_size: usize,
        num_heads: usize,
    ) -> Self {
        Self {
            query,
            key,
            value,
            output,
            num_heads,
            head_dim: hidden_size / num_heads,
        }
    }

    fn split_heads(&self, xs: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = xs.dims3()?;
        xs.reshape((batch, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }

    pub fn forward(&self, hidden_states: &Tensor, bias: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, hidden_size) = hidden_states.dims3()?;

        let q = self.split_heads(&hidden_states.apply(&self.query)?)?;
        let k = self.split_heads(&hidden_states.apply(&self.key)?)?;
        let v = self.split_heads(&hidden_states.apply(&self.value)?)?;

        let scale = (self.head_dim as f64).powf(-0.5);
        let q = (q * scale)?;

        let scores = q.matmul(&k.transpose(D::Minus2, D::Minus1)?.contiguous()?)?;
        let scores = scores.broadcast_add(bias)?;
        let probs = softmax(&scores, D::Minus1)?;

        probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, hidden_size))?
            .apply(&self.output)
    }
}

/// Position-wise feed-forward block: `down(gelu(up(x)))`.
#[derive(Debug, Clone)]
pub struct FeedForward {
    up: Linear,
    down: Linear,
}

impl FeedForward {
    pub fn new(up: Linear, down: Linear) -> Self {
        Self { up, down }
    }
}

impl Module for FeedForward {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        xs.apply(&self.up)?.gelu_erf()?.apply(&self.down)
    }
}
