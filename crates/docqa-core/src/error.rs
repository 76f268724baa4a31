use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Ingestion incomplete: {failed} of {total} documents failed")]
    IngestionPartialFailure { failed: usize, total: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Document error: {0}")]
    Document(String),
}

impl Error {
    pub fn model<E: std::fmt::Display>(err: E) -> Self {
        Error::ModelUnavailable(err.to_string())
    }

    pub fn index<E: std::fmt::Display>(err: E) -> Self {
        Error::IndexUnavailable(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        Error::GenerationFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
