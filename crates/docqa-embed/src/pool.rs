use candle_core::{DType, Result, Tensor, D};

/// Average of the token vectors the mask keeps: `[B,T,H] x [B,T] -> [B,H]`.
pub fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(D::Minus1)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let kept = mask.sum(1)?;
    summed.broadcast_div(&kept)
}

/// Scales each row to unit length; all-zero rows stay zero.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let eps = match rows.dtype() { DType::F16 | DType::BF16 => 1e-6, _ => 1e-12 };
    let norm = rows.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?.affine(1.0, eps)?;
    rows.broadcast_div(&norm)
}

pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    l2_normalize(&mean_pool(hidden, attention_mask)?)
}
