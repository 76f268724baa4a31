//! Directory ingestion: discover, extract, chunk, embed (cache-first), upsert.

use std::path::Path;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use docqa_core::chunker::Chunker;
use docqa_core::data_processor::{document_name, DataProcessor};
use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, IndexEntry, IngestionFailure, IngestionSummary};
use docqa_vector::{hash_content, CacheEntry, VectorIndex};

pub struct Ingestor {
    chunker: Chunker,
    processor: DataProcessor,
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
}

impl Ingestor {
    pub fn new(chunker: Chunker, embedder: Arc<dyn Embedder>, index: Arc<VectorIndex>) -> Result<Self> {
        if embedder.dim() != index.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder '{}' produces {} dims but the index stores {}",
                embedder.model_id(),
                embedder.dim(),
                index.dim()
            )));
        }
        Ok(Self { chunker, processor: DataProcessor::new(), embedder, index })
    }

    pub fn with_processor(mut self, processor: DataProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Ingests every supported file under `dir`. A missing directory is
    /// created and yields an empty summary. Per-document failures are
    /// collected, never propagated.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestionSummary> {
        let mut summary = IngestionSummary::default();
        if !dir.exists() {
            std::fs::create_dir_all(dir).map_err(|e| Error::Document(format!("{}: {}", dir.display(), e)))?;
            tracing::info!(dir = %dir.display(), "created empty ingestion directory");
            return Ok(summary);
        }

        let paths = self.processor.list_documents(dir);
        tracing::info!(dir = %dir.display(), files = paths.len(), "ingesting documents");
        let pb = ProgressBar::new(paths.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        for path in &paths {
            let name = document_name(path, dir);
            pb.set_message(name.clone());
            match self.ingest_file(path, dir).await {
                Ok(chunks) => {
                    summary.documents_processed += 1;
                    summary.chunks_created += chunks;
                    tracing::debug!(document = %name, chunks, "document ingested");
                }
                Err(e) => {
                    tracing::warn!(document = %name, error = %e, "document failed");
                    summary.failures.push(IngestionFailure { document: name, reason: e.to_string() });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        tracing::info!(
            processed = summary.documents_processed,
            chunks = summary.chunks_created,
            failed = summary.failures.len(),
            "ingestion finished"
        );
        Ok(summary)
    }

    async fn ingest_file(&self, path: &Path, root: &Path) -> Result<usize> {
        let document = self.processor.load(path, root)?;
        let chunks = self.chunker.chunk_document(&document);
        if chunks.is_empty() {
            return Err(Error::Document("no extractable text".into()));
        }
        // Unchanged chunks and an already-trimmed tail cause no index write.
        let stored = self.index.stored_hashes(&document.name).await?;
        let changed: Vec<Chunk> = chunks
            .iter()
            .filter(|c| stored.get(&c.chunk_index) != Some(&hash_content(&c.text)))
            .cloned()
            .collect();
        if !changed.is_empty() {
            let entries = self.embed_chunks(&changed).await?;
            self.index.upsert(&entries).await?;
        }
        if stored.keys().any(|&i| i >= chunks.len()) {
            self.index.prune_document(&document.name, chunks.len()).await?;
        }
        tracing::debug!(document = %document.name, changed = changed.len(), "index entries up to date");
        Ok(chunks.len())
    }

    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<IndexEntry>> {
        let embedder_id = self.embedder.model_id().to_string();
        let hashes: Vec<String> = chunks.iter().map(|c| hash_content(&c.text)).collect();
        let mut vectors = self.index.cached_embeddings(&embedder_id, &hashes).await?;

        let mut missing: Vec<(String, String)> = Vec::new();
        for (chunk, hash) in chunks.iter().zip(&hashes) {
            if !vectors.contains_key(hash) && !missing.iter().any(|(h, _)| h == hash) {
                missing.push((hash.clone(), chunk.text.clone()));
            }
        }
        let embedded = missing.len();
        if !missing.is_empty() {
            let texts: Vec<String> = missing.iter().map(|(_, t)| t.clone()).collect();
            let fresh = self.embedder.embed_batch(&texts)?;
            let cache: Vec<CacheEntry> = missing
                .into_iter()
                .zip(fresh)
                .map(|((content_hash, _), vector)| CacheEntry { content_hash, embedder_id: embedder_id.clone(), vector })
                .collect();
            self.index.cache_embeddings(&cache).await?;
            vectors.extend(cache.into_iter().map(|e| (e.content_hash, e.vector)));
        }
        tracing::debug!(chunks = chunks.len(), embedded, "embeddings ready");

        chunks
            .iter()
            .zip(hashes)
            .map(|(chunk, content_hash)| {
                let vector = vectors
                    .get(&content_hash)
                    .cloned()
                    .ok_or_else(|| Error::ModelUnavailable(format!("no embedding for chunk {}", chunk.id())))?;
                Ok(IndexEntry {
                    id: chunk.id(),
                    document: chunk.document.clone(),
                    chunk_index: chunk.chunk_index,
                    text: chunk.text.clone(),
                    content_hash,
                    vector,
                })
            })
            .collect()
    }
}
