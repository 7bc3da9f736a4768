use std::time::Duration;

use thiserror::Error;

/// Failure talking to an embedding backend.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("request to embedding backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("embedding backend misconfigured: {0}")]
    Config(String),

    #[error("embedding backend returned malformed payload: {0}")]
    MalformedResponse(String),
}

/// Failure querying the vector store.
#[derive(Debug, Error)]
#[error("vector store query failed: {0}")]
pub struct VectorStoreError(pub String);

/// Errors a search surfaces to the caller.
///
/// Only failures with no in-pipeline fallback live here: retrieval cannot
/// proceed without embeddings or the vector store, and a request-level
/// timeout aborts the whole search. A reranker failure is not an error at
/// this level; the pipeline degrades and reports it via
/// [`crate::rerank::RerankOutcome`]. Zero candidates is an empty result,
/// not an error.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}
