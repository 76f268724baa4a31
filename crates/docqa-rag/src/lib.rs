//! docqa-rag
//!
//! The ingestion and query pipelines, and `Assistant`, which wires them to
//! the configured embedder, vector index and generator.

pub mod ingest;
pub mod prompt;
pub mod query;

use std::path::PathBuf;
use std::sync::Arc;

use docqa_core::chunker::Chunker;
use docqa_core::config::AppConfig;
use docqa_core::error::Result;
use docqa_core::traits::{Embedder, Generator};
use docqa_embed::get_default_embedder;
use docqa_llm::GeminiGenerator;
use docqa_vector::VectorIndex;

pub use ingest::Ingestor;
pub use prompt::build_prompt;
pub use query::QueryEngine;

pub struct Assistant {
    pub ingestor: Ingestor,
    pub query: QueryEngine,
    pub index: Arc<VectorIndex>,
    documents_dir: PathBuf,
}

impl Assistant {
    /// Builds the default stack: configured embedder, LanceDB index and the
    /// Gemini generator.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let embedder = get_default_embedder(&config.embedding)?;
        let generator: Arc<dyn Generator> = Arc::new(GeminiGenerator::new(&config.generation)?);
        Self::with_components(config, embedder, generator).await
    }

    pub async fn with_components(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let index = Arc::new(VectorIndex::open(&config.data.index_dir(), &config.data.table, embedder.dim()).await?);
        let ingestor = Ingestor::new(Chunker::new(config.chunking)?, embedder.clone(), index.clone())?;
        let query = QueryEngine::new(embedder, index.clone(), generator, config.retrieval.clone())?;
        Ok(Self { ingestor, query, index, documents_dir: config.data.documents_dir() })
    }

    pub fn documents_dir(&self) -> &std::path::Path {
        &self.documents_dir
    }
}
