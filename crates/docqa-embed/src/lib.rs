//! docqa-embed
//!
//! Sentence embeddings for chunks and questions. `SentenceEmbedder` runs a
//! BERT-family model (all-MiniLM-L6-v2 by default) through candle;
//! `HashingEmbedder` is a deterministic stand-in for tests and development.

pub mod pool;
pub mod tokenize;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;
use twox_hash::XxHash64;

use docqa_core::config::EmbeddingConfig;
use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;

pub use pool::masked_mean_l2;

/// Metal when built with the `metal` feature and a GPU is present, else CPU.
fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                tracing::info!("embedding on Metal");
                return dev;
            }
            Err(e) => tracing::warn!(error = %e, "Metal unavailable, falling back to CPU"),
        }
    }
    tracing::info!("embedding on CPU");
    Device::Cpu
}

pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    id: String,
}

impl SentenceEmbedder {
    /// Loads `config.json`, `tokenizer.json` and `model.safetensors`
    /// (or `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(Error::ModelUnavailable(format!("model directory {} not found", model_dir.display())));
        }
        let device = select_device();
        tracing::info!(model_dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::ModelUnavailable(format!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)))?;
        tokenize::configure_truncation(&mut tokenizer, max_len)?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::ModelUnavailable(format!("{}: {}", config_path.display(), e)))?;
        let config: BertConfig = serde_json::from_str(&raw_config).map_err(Error::model)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)
            .ok()
            .and_then(|v| v.get("hidden_size").and_then(|h| h.as_u64()))
            .ok_or_else(|| Error::ModelUnavailable("config.json has no hidden_size".into()))? as usize;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is not modified while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DTYPE, &device) }.map_err(Error::model)?
        } else {
            let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin")).map_err(Error::model)?;
            let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DTYPE, &device)
        };
        let model = BertModel::load(vb, &config).map_err(Error::model)?;

        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let id = format!("bert:{}:d{}", name, dim);
        tracing::info!(%id, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, id })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask, token_type_ids) =
            tokenize::tokenize_on_device(&self.tokenizer, text, &self.device)?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(Error::model)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask).map_err(Error::model)?;
        let emb: Vec<f32> = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1())
            .map_err(Error::model)?;
        if emb.len() != self.dim {
            return Err(Error::ModelUnavailable(format!("model returned {} dims, expected {}", emb.len(), self.dim)));
        }
        if start.elapsed().as_millis() > 100 { tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

impl Embedder for SentenceEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed(&self, text: &str) -> Result<Vec<f32>> { self.embed_one(text) }
}

/// Bag-of-words embedder: each normalised token is hashed into a bucket.
/// Deterministic and L2-normalised, so texts sharing words score higher.
pub struct HashingEmbedder { dim: usize, id: String }

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1), id: format!("hash:xxh64:d{}", dim.max(1)) }
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let lowered = token.to_lowercase();
            let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
            let key = if trimmed.is_empty() { lowered.as_str() } else { trimmed };
            let mut hasher = XxHash64::with_seed(0);
            key.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            v[idx] += 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        Ok(v)
    }
}

/// `APP_USE_FAKE_EMBEDDINGS=1` (or `embedding.use_fake`) selects the hashing embedder.
pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
        || config.use_fake;
    if use_fake {
        tracing::info!(dim = config.fake_dim, "using HashingEmbedder");
        return Ok(Arc::new(HashingEmbedder::new(config.fake_dim)));
    }
    Ok(Arc::new(SentenceEmbedder::load(&config.model_dir(), config.max_len)?))
}
