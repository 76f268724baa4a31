use async_trait::async_trait;

use crate::error::Result;
use crate::types::OutputFormat;

pub trait Embedder: Send + Sync {
    /// Stable identifier for the model, used to key the embedding cache.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, format: OutputFormat) -> Result<String>;
}
