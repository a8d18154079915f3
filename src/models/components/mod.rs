pub mod attention;
pub mod labels;

pub use attention::{attention_bias, FeedForward, SelfAttention};
pub use labels::ClassLabels;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use crate::core::{Result, SentimentError};

/// A single tokenized sequence ready for an encoder forward pass.
pub struct EncodedText {
    /// `(1, seq)` token ids.
    pub input_ids: Tensor,
    /// `(1, seq)` 0/1 mask.
    pub attention_mask: Tensor,
    pub ids: Vec<u32>,
}

pub fn encode(tokenizer: &Tokenizer, text: &str, device: &Device) -> Result<EncodedText> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| SentimentError::Tokenization(e.to_string()))?;

    let ids = encoding.get_ids().to_vec();
    if ids.is_empty() {
        return Err(SentimentError::Tokenization(
            "text produced no tokens".into(),
        ));
    }

    let input_ids = Tensor::new(ids.as_slice(), device)?.unsqueeze(0)?;
    let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

    Ok(EncodedText {
        input_ids,
        attention_mask,
        ids,
    })
}
