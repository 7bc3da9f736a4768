//! Code-specialized embedding backend (Voyage-compatible API).
//!
//! Uses asymmetric `input_type` encoding: documents and queries are embedded
//! differently, which measurably improves retrieval on code.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

use super::{truncate_for_embedding, EmbeddingProvider};

/// Voyage accepts up to 128 texts per batch.
const BATCH_SIZE: usize = 128;

/// Character cap per text. The backend tokenizes at roughly 2-3 chars per
/// token; this keeps even dense content inside the context window.
const MAX_EMBED_CHARS: usize = 16_000;

pub struct VoyageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl VoyageProvider {
    pub fn new(config: &EmbeddingConfig, client: reqwest::Client) -> Result<Self, EmbeddingError> {
        let api_key = config
            .voyage_api_key
            .clone()
            .ok_or_else(|| EmbeddingError::Config("VOYAGE_API_KEY not set".to_string()))?;

        Ok(Self {
            client,
            base_url: config.voyage_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.voyage_model.clone(),
            dimension: config.voyage_dimension,
        })
    }

    async fn embed(
        &self,
        texts: &[String],
        input_type: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let input: Vec<String> = chunk
                .iter()
                .map(|t| truncate_for_embedding(t, MAX_EMBED_CHARS).to_string())
                .collect();

            let req = VoyageEmbedRequest {
                model: self.model.clone(),
                input,
                input_type: input_type.to_string(),
                output_dimension: self.dimension,
            };

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&req)
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                return Err(EmbeddingError::Api { status, body });
            }

            let body: VoyageEmbedResponse = resp.json().await?;
            if body.data.len() != chunk.len() {
                return Err(EmbeddingError::MalformedResponse(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    body.data.len()
                )));
            }
            all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
        }

        Ok(all_embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for VoyageProvider {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts, "document").await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self.embed(&[query.to_string()], "query").await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::MalformedResponse("no embedding returned".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct VoyageEmbedRequest {
    model: String,
    input: Vec<String>,
    input_type: String,
    output_dimension: usize,
}

#[derive(Deserialize)]
struct VoyageEmbedResponse {
    data: Vec<VoyageEmbedData>,
}

#[derive(Deserialize)]
struct VoyageEmbedData {
    embedding: Vec<f32>,
}
