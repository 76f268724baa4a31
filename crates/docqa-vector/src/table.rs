//! LanceDB connection and housekeeping helpers.
//!
//! Opening the database, ensure-* helpers for tables, typed column access
//! and the small SQL/Arrow conversions shared by the index and the cache.

use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator};
use arrow_schema::Schema;
use lancedb::{connect, Connection, Table};

use docqa_core::error::{Error, Result};

use crate::schema::vector_dim;

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(Error::index)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(Error::index)?;
    Ok(names.iter().any(|n| n == name))
}

/// Creates `name` with 0 rows if missing; an existing table must have the
/// same vector dimension as `schema`.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<Table> {
    if table_exists(conn, name).await? {
        let table = conn.open_table(name).execute().await.map_err(Error::index)?;
        let existing = table.schema().await.map_err(Error::index)?;
        let (want, have) = (vector_dim(&schema), vector_dim(&existing));
        if want != have {
            return Err(Error::IndexUnavailable(format!(
                "table '{}' stores vectors of dimension {:?}, embedder produces {:?}",
                name, have, want
            )));
        }
        return Ok(table);
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await.map_err(Error::index)
}

pub fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::IndexUnavailable(format!("column '{}' missing or mistyped", name)))
}

pub fn vectors_array<'a, I>(vectors: I, dim: i32) -> FixedSizeListArray
where
    I: IntoIterator<Item = &'a Vec<f32>>,
{
    let values: Vec<Option<Vec<Option<f32>>>> =
        vectors.into_iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect())).collect();
    FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(values, dim)
}

/// Single-quoted SQL string literal for LanceDB filter predicates.
pub fn sql_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
