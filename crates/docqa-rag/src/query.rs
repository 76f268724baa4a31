//! Question answering over the index: embed, retrieve, prompt, generate.

use std::sync::Arc;

use docqa_core::config::RetrievalConfig;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, Generator};
use docqa_core::types::{Answer, OutputFormat, RetrievedChunk};
use docqa_core::NO_CONTEXT_ANSWER;
use docqa_vector::VectorIndex;

use crate::prompt::build_prompt;

pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
    generator: Arc<dyn Generator>,
    retrieval: RetrievalConfig,
}

impl QueryEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<VectorIndex>,
        generator: Arc<dyn Generator>,
        retrieval: RetrievalConfig,
    ) -> Result<Self> {
        if embedder.dim() != index.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder '{}' produces {} dims but the index stores {}",
                embedder.model_id(),
                embedder.dim(),
                index.dim()
            )));
        }
        Ok(Self { embedder, index, generator, retrieval })
    }

    /// Hits for `question` at or above the relevance floor, best first.
    pub async fn retrieve(&self, question: &str, top_k: Option<usize>) -> Result<Vec<RetrievedChunk>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidQuery("query must not be empty".into()));
        }
        let k = top_k.unwrap_or(self.retrieval.top_k);
        let vector = self.embedder.embed(question).map_err(|e| match e {
            Error::ModelUnavailable(_) => e,
            other => Error::model(other),
        })?;
        let mut hits = self.index.search(&vector, k).await?;
        if let Some(floor) = self.retrieval.min_score {
            hits.retain(|h| h.score >= floor);
        }
        tracing::debug!(k, hits = hits.len(), "retrieved context");
        Ok(hits)
    }

    pub async fn answer(&self, question: &str, top_k: Option<usize>) -> Result<Answer> {
        let hits = self.retrieve(question, top_k).await?;
        if hits.is_empty() {
            tracing::info!("no relevant context, returning fallback answer");
            return Ok(Answer { answer: NO_CONTEXT_ANSWER.to_string(), context: Vec::new(), num_sources: 0 });
        }

        let prompt = build_prompt(question.trim(), &hits);
        let answer = self.generator.generate(&prompt, OutputFormat::PlainText).await.map_err(|e| match e {
            Error::GenerationFailed(_) => e,
            other => Error::generation(other),
        })?;
        tracing::info!(sources = hits.len(), "answer generated");
        Ok(Answer {
            answer,
            num_sources: hits.len(),
            context: hits.into_iter().map(|h| h.text).collect(),
        })
    }
}
