//! Lance-backed embedding cache keyed by `(content_hash, embedder_id)`.
//!
//! Consulted before calling the embedder, so re-ingesting unchanged text does
//! not run the model again.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;

use docqa_core::error::{Error, Result};

use crate::schema::build_cache_schema;
use crate::table::{column, sql_literal, vectors_array};

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub content_hash: String,
    pub embedder_id: String,
    pub vector: Vec<f32>,
}

pub fn hash_content(s: &str) -> String {
    blake3::hash(s.as_bytes()).to_hex().to_string()
}

pub async fn get_many(
    table: &Table,
    embedder_id: &str,
    hashes: &[String],
    dim: usize,
) -> Result<HashMap<String, Vec<f32>>> {
    let mut out = HashMap::new();
    if hashes.is_empty() { return Ok(out); }
    let in_list = hashes.iter().map(|h| sql_literal(h)).collect::<Vec<_>>().join(",");
    let predicate = format!("embedder_id = {} AND content_hash IN ({})", sql_literal(embedder_id), in_list);
    let mut stream = table.query().only_if(predicate).execute().await.map_err(Error::index)?;
    while let Some(batch) = stream.try_next().await.map_err(Error::index)? {
        let hash_col = column::<StringArray>(&batch, "content_hash")?;
        let vec_col = column::<FixedSizeListArray>(&batch, "vector")?;
        for i in 0..batch.num_rows() {
            let list = vec_col.value(i);
            let vals: Vec<f32> = list.as_primitive::<Float32Type>().values().to_vec();
            if vals.len() == dim { out.insert(hash_col.value(i).to_string(), vals); }
        }
    }
    Ok(out)
}

/// Writes through on embedding misses; keyed by `(content_hash, embedder_id)`.
/// A key already present keeps its stored vector.
pub async fn put_many(table: &Table, entries: &[CacheEntry], dim: usize) -> Result<()> {
    if entries.is_empty() { return Ok(()); }
    let schema = build_cache_schema(dim as i32);
    let now = Utc::now().timestamp_millis();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.content_hash.as_str()))),
            Arc::new(StringArray::from_iter_values(entries.iter().map(|e| e.embedder_id.as_str()))),
            Arc::new(TimestampMillisecondArray::from(vec![now; entries.len()])),
            Arc::new(vectors_array(entries.iter().map(|e| &e.vector), dim as i32)),
        ],
    )
    .map_err(Error::index)?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
    let mut mi = table.merge_insert(&["content_hash", "embedder_id"]);
    mi.when_not_matched_insert_all();
    mi.execute(reader).await.map_err(Error::index)?;
    Ok(())
}
