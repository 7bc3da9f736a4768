//! General-purpose embedding backend (OpenAI-compatible API).
//!
//! Fallback when the code-specialized backend is unavailable. The API has no
//! document/query asymmetry, so both paths encode identically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

use super::{truncate_for_embedding, EmbeddingProvider};

const BATCH_SIZE: usize = 100;
const MAX_EMBED_CHARS: usize = 8_000;

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig, client: reqwest::Client) -> Result<Self, EmbeddingError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| EmbeddingError::Config("OPENAI_API_KEY not set".to_string()))?;

        // Dimension follows the model family.
        let dimension = if config.openai_model.contains("small") {
            1536
        } else {
            3072
        };

        Ok(Self {
            client,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.openai_model.clone(),
            dimension,
        })
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let input: Vec<String> = chunk
                .iter()
                .map(|t| truncate_for_embedding(t, MAX_EMBED_CHARS).to_string())
                .collect();

            let req = OpenAiEmbedRequest {
                model: self.model.clone(),
                input,
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

            let body: OpenAiEmbedResponse = resp.json().await?;
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
impl EmbeddingProvider for OpenAiProvider {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed(texts).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self.embed(&[query.to_string()]).await?;
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
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let config = EmbeddingConfig::default();
        assert!(OpenAiProvider::new(&config, reqwest::Client::new()).is_err());
    }

    #[test]
    fn test_dimension_follows_model_family() {
        let small = EmbeddingConfig {
            openai_api_key: Some("ok".to_string()),
            openai_model: "text-embedding-3-small".to_string(),
            ..Default::default()
        };
        let large = EmbeddingConfig {
            openai_api_key: Some("ok".to_string()),
            openai_model: "text-embedding-3-large".to_string(),
            ..Default::default()
        };
        assert_eq!(
            OpenAiProvider::new(&small, reqwest::Client::new()).unwrap().dimension(),
            1536
        );
        assert_eq!(
            OpenAiProvider::new(&large, reqwest::Client::new()).unwrap().dimension(),
            3072
        );
    }
}
