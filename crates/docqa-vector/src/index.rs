use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use arrow_array::{Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};

use docqa_core::error::{Error, Result};
use docqa_core::types::{IndexEntry, IndexStats, RetrievedChunk};

use crate::cache::{self, CacheEntry};
use crate::schema::{build_cache_schema, build_chunks_schema};
use crate::table::{column, ensure_table, open_db, sql_literal, vectors_array};

pub const DEFAULT_TABLE: &str = "pdf_knowledge";
const CACHE_TABLE: &str = "embedding_cache";
const WRITE_BATCH: usize = 1000;

/// Persistent chunk store. One writer at a time; readers may run concurrently.
pub struct VectorIndex {
    conn: Connection,
    table_name: String,
    dim: usize,
}

impl VectorIndex {
    /// Opens (creating if needed) the chunk table at `path` for vectors of `dim`.
    pub async fn open(path: &Path, table_name: &str, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("vector dimension must be > 0".into()));
        }
        std::fs::create_dir_all(path).map_err(|e| Error::IndexUnavailable(format!("{}: {}", path.display(), e)))?;
        let conn = open_db(&path.to_string_lossy()).await?;
        ensure_table(&conn, table_name, build_chunks_schema(dim as i32)).await?;
        ensure_table(&conn, CACHE_TABLE, build_cache_schema(dim as i32)).await?;
        tracing::info!(path = %path.display(), table = table_name, dim, "vector index opened");
        Ok(Self { conn, table_name: table_name.to_string(), dim })
    }

    pub fn dim(&self) -> usize { self.dim }
    pub fn table_name(&self) -> &str { &self.table_name }

    async fn chunks(&self) -> Result<Table> {
        self.conn.open_table(&self.table_name).execute().await.map_err(Error::index)
    }

    async fn cache(&self) -> Result<Table> {
        self.conn.open_table(CACHE_TABLE).execute().await.map_err(Error::index)
    }

    /// Writes entries, replacing an existing entry with the same id when its
    /// content hash differs.
    pub async fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
        if entries.is_empty() { return Ok(()); }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != self.dim) {
            return Err(Error::IndexUnavailable(format!(
                "entry '{}' has {} dims, index expects {}",
                bad.id, bad.vector.len(), self.dim
            )));
        }
        let table = self.chunks().await?;
        for batch in entries.chunks(WRITE_BATCH) {
            let record_batch = self.entries_to_record_batch(batch)?;
            let schema = record_batch.schema();
            let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
            let mut mi = table.merge_insert(&["id"]);
            mi.when_matched_update_all(Some("target.content_hash != source.content_hash".to_string()))
                .when_not_matched_insert_all();
            mi.execute(reader).await.map_err(Error::index)?;
        }
        tracing::debug!(count = entries.len(), table = %self.table_name, "upserted entries");
        Ok(())
    }

    fn entries_to_record_batch(&self, entries: &[IndexEntry]) -> Result<RecordBatch> {
        let chunk_indices = entries
            .iter()
            .map(|e| i32::try_from(e.chunk_index).map_err(|_| Error::IndexUnavailable(format!("chunk index {} too large", e.chunk_index))))
            .collect::<Result<Vec<i32>>>()?;
        RecordBatch::try_new(
            build_chunks_schema(self.dim as i32),
            vec![
                Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.id.as_str()))),
                Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.document.as_str()))),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.text.as_str()))),
                Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.content_hash.as_str()))),
                Arc::new(vectors_array(entries.iter().map(|e| &e.vector), self.dim as i32)),
            ],
        )
        .map_err(Error::index)
    }

    /// The `k` most similar entries by cosine similarity, best first.
    /// Equal scores are ordered by `(document, chunk_index)`, including at
    /// the `k` cutoff: the candidate window widens until the row after the
    /// cutoff scores strictly lower.
    pub async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 { return Ok(Vec::new()); }
        if vector.len() != self.dim {
            return Err(Error::IndexUnavailable(format!("query has {} dims, index expects {}", vector.len(), self.dim)));
        }
        let table = self.chunks().await?;
        let total = table.count_rows(None).await.map_err(Error::index)?;
        if total == 0 { return Ok(Vec::new()); }

        let mut limit = (k + 1).min(total);
        loop {
            let (mut hits, rows) = self.nearest(&table, vector, limit).await?;
            sort_hits(&mut hits);
            let settled = rows < limit
                || limit >= total
                || hits.len() <= k
                || hits[k].score < hits[k - 1].score;
            if settled {
                hits.truncate(k);
                return Ok(hits);
            }
            limit = (limit * 2).min(total);
        }
    }

    /// Raw nearest-neighbour rows (unsorted) and how many rows came back.
    async fn nearest(&self, table: &Table, vector: &[f32], limit: usize) -> Result<(Vec<RetrievedChunk>, usize)> {
        let mut stream = table
            .vector_search(vector.to_vec())
            .map_err(Error::index)?
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(Error::index)?;
        let mut hits = Vec::new();
        let mut rows = 0;
        while let Some(batch) = stream.try_next().await.map_err(Error::index)? {
            rows += batch.num_rows();
            let ids = column::<StringArray>(&batch, "id")?;
            let documents = column::<StringArray>(&batch, "document")?;
            let indices = column::<Int32Array>(&batch, "chunk_index")?;
            let texts = column::<StringArray>(&batch, "text")?;
            let distances = column::<Float32Array>(&batch, "_distance")?;
            for i in 0..batch.num_rows() {
                let score = 1.0 - distances.value(i);
                if score.is_nan() { continue; }
                hits.push(RetrievedChunk {
                    id: ids.value(i).to_string(),
                    document: documents.value(i).to_string(),
                    chunk_index: indices.value(i).max(0) as usize,
                    text: texts.value(i).to_string(),
                    score,
                });
            }
        }
        Ok((hits, rows))
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        let table = self.chunks().await?;
        let total_chunks = table.count_rows(None).await.map_err(Error::index)?;
        let total_documents = self.documents().await?.len();
        Ok(IndexStats { total_chunks, total_documents })
    }

    /// Distinct document names, sorted.
    pub async fn documents(&self) -> Result<Vec<String>> {
        let table = self.chunks().await?;
        let mut names = BTreeSet::new();
        let mut stream = table
            .query()
            .select(Select::columns(&["document"]))
            .execute()
            .await
            .map_err(Error::index)?;
        while let Some(batch) = stream.try_next().await.map_err(Error::index)? {
            let col = column::<StringArray>(&batch, "document")?;
            for i in 0..batch.num_rows() {
                names.insert(col.value(i).to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    /// `chunk_index -> content_hash` of the stored entries of `document`.
    pub async fn stored_hashes(&self, document: &str) -> Result<HashMap<usize, String>> {
        let table = self.chunks().await?;
        let mut stream = table
            .query()
            .only_if(format!("document = {}", sql_literal(document)))
            .select(Select::columns(&["chunk_index", "content_hash"]))
            .execute()
            .await
            .map_err(Error::index)?;
        let mut out = HashMap::new();
        while let Some(batch) = stream.try_next().await.map_err(Error::index)? {
            let indices = column::<Int32Array>(&batch, "chunk_index")?;
            let hashes = column::<StringArray>(&batch, "content_hash")?;
            for i in 0..batch.num_rows() {
                out.insert(indices.value(i).max(0) as usize, hashes.value(i).to_string());
            }
        }
        Ok(out)
    }

    /// Current version of the chunk table; bumps on every committed write.
    pub async fn version(&self) -> Result<u64> {
        self.chunks().await?.version().await.map_err(Error::index)
    }

    /// Current version of the embedding cache table.
    pub async fn cache_version(&self) -> Result<u64> {
        self.cache().await?.version().await.map_err(Error::index)
    }

    /// Drops entries of `document` at or beyond `keep`, left over from a
    /// previous, longer version of the document.
    pub async fn prune_document(&self, document: &str, keep: usize) -> Result<()> {
        let table = self.chunks().await?;
        let predicate = format!("document = {} AND chunk_index >= {}", sql_literal(document), keep);
        table.delete(&predicate).await.map_err(Error::index)?;
        Ok(())
    }

    /// Removes every entry and the embedding cache.
    pub async fn clear(&self) -> Result<()> {
        self.chunks().await?.delete("true").await.map_err(Error::index)?;
        self.cache().await?.delete("true").await.map_err(Error::index)?;
        tracing::info!(table = %self.table_name, "index cleared");
        Ok(())
    }

    pub async fn cached_embeddings(&self, embedder_id: &str, hashes: &[String]) -> Result<HashMap<String, Vec<f32>>> {
        cache::get_many(&self.cache().await?, embedder_id, hashes, self.dim).await
    }

    pub async fn cache_embeddings(&self, entries: &[CacheEntry]) -> Result<()> {
        cache::put_many(&self.cache().await?, entries, self.dim).await
    }
}

fn sort_hits(hits: &mut [RetrievedChunk]) {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.document.cmp(&b.document))
            .then_with(|| a.chunk_index.cmp(&b.chunk_index))
    });
}
