use candle_core::{Device, Tensor};
use tokenizers::{Tokenizer, TruncationParams};

use docqa_core::error::{Error, Result};

/// Caps encodings at `max_len` tokens including the special tokens, so a
/// truncated sequence still ends with `[SEP]`.
pub fn configure_truncation(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
        .map_err(|e| Error::ModelUnavailable(format!("Invalid truncation settings: {}", e)))?;
    Ok(())
}

/// Returns `(input_ids, attention_mask, token_type_ids)`, each shaped `[1, T]`.
/// A single sequence needs no padding.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| Error::ModelUnavailable(format!("Tokenization failed: {}", e)))?;
    let len = enc.get_ids().len();
    let input_ids = Tensor::new(enc.get_ids(), device).and_then(|t| t.reshape((1, len))).map_err(Error::model)?;
    let attention_mask = Tensor::new(enc.get_attention_mask(), device).and_then(|t| t.reshape((1, len))).map_err(Error::model)?;
    let token_type_ids = input_ids.zeros_like().map_err(Error::model)?;
    Ok((input_ids, attention_mask, token_type_ids))
}
