//! Embedding provider abstraction.
//!
//! Two reqwest-backed implementations: a code-specialized backend
//! ([`voyage::VoyageProvider`]) and a general-purpose fallback
//! ([`openai::OpenAiProvider`]). Both encode queries and documents
//! asymmetrically where the backend supports it, batch inputs below the
//! backend limit, and truncate over-long texts instead of dropping them.
//!
//! No retries live at this layer; a backend failure maps to
//! [`EmbeddingError`] and the caller decides what to do.

pub mod openai;
pub mod voyage;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

/// Turns text into vectors. Document and query encodings may differ.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of documents (code chunks / descriptions).
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a search query.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output vector dimension.
    fn dimension(&self) -> usize;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Truncate `text` to at most `max_chars`, splitting on a UTF-8 char boundary.
pub(crate) fn truncate_for_embedding(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Build a provider from config.
///
/// `provider = "auto"` prefers the code-specialized backend and falls back
/// to the general-purpose one if it cannot initialize; the fallback is
/// logged once and never crashes the process.
pub fn build_provider(
    config: &EmbeddingConfig,
    client: reqwest::Client,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    match config.provider.as_str() {
        "voyage" => Ok(Arc::new(voyage::VoyageProvider::new(config, client)?)),
        "openai" => Ok(Arc::new(openai::OpenAiProvider::new(config, client)?)),
        "auto" => {
            match voyage::VoyageProvider::new(config, client.clone()) {
                Ok(provider) => Ok(Arc::new(provider)),
                Err(e) => {
                    tracing::warn!(error = %e, "code-specialized embeddings unavailable, falling back");
                    Ok(Arc::new(openai::OpenAiProvider::new(config, client)?))
                }
            }
        }
        other => Err(EmbeddingError::Config(format!(
            "unknown embedding provider: {other}"
        ))),
    }
}
