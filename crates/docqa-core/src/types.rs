//! Domain types shared by the ingestion and query pipelines.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type ChunkId = String;

/// A source file read at ingestion time.
///
/// `name` is the path relative to the ingestion root and is the stable
/// document identity stored with every chunk.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
    pub text: String,
}

/// A contiguous word window of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub document: String,
    pub chunk_index: usize,
    pub text: String,
}

impl Chunk {
    pub fn id(&self) -> ChunkId {
        chunk_id(&self.document, self.chunk_index)
    }
}

/// Deterministic entry id, so re-ingesting a document overwrites its entries.
pub fn chunk_id(document: &str, chunk_index: usize) -> ChunkId {
    format!("{}:{}", document, chunk_index)
}

/// The persisted unit of the vector index.
///
/// - `id`: `"{document}:{chunk_index}"`
/// - `content_hash`: blake3 of `text`, used by the embedding cache
/// - `vector`: embedding of `text`; its length must equal the index dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: ChunkId,
    pub document: String,
    pub chunk_index: usize,
    pub text: String,
    pub content_hash: String,
    pub vector: Vec<f32>,
}

/// One search hit. `score` is cosine similarity, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: ChunkId,
    pub document: String,
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub total_documents: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionFailure {
    pub document: String,
    pub reason: String,
}

/// Result of one ingestion run. Failures never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub documents_processed: usize,
    pub chunks_created: usize,
    pub failures: Vec<IngestionFailure>,
}

impl IngestionSummary {
    /// Turns a summary with failures into `Error::IngestionPartialFailure`.
    pub fn ensure_complete(self) -> crate::error::Result<Self> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        Err(crate::error::Error::IngestionPartialFailure {
            failed: self.failures.len(),
            total: self.documents_processed + self.failures.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub context: Vec<String>,
    pub num_sources: usize,
}

/// Output-format hint passed to the generation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    PlainText,
    Json,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::PlainText => "text/plain",
            OutputFormat::Json => "application/json",
        }
    }
}
