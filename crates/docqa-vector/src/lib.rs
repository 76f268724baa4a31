//! docqa-vector
//!
//! LanceDB-backed vector index for document chunks, plus the embedding cache
//! the ingestion pipeline consults before running the model.

pub mod cache;
pub mod index;
pub mod schema;
pub mod table;

pub use cache::{hash_content, CacheEntry};
pub use index::{VectorIndex, DEFAULT_TABLE};
