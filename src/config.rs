use std::time::Duration;

use serde::{Deserialize, Serialize};

/// RRF constant. Inherited from the standard formulation; no tuning behind
/// it, so it stays configurable rather than hardcoded at use sites.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Default fusion weights: semantic similarity carries most of the signal,
/// lexical overlap breaks the rest.
pub const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.7;
pub const DEFAULT_BM25_WEIGHT: f32 = 0.3;

/// Rerank results below this relevance are dropped outright.
pub const DEFAULT_MIN_RELEVANCE: f32 = 0.01;

/// Process-wide engine configuration. Built once at startup and passed by
/// reference into request handlers; request-scoped knobs live in
/// [`crate::models::SearchConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub embedding: EmbeddingConfig,
    pub reranker: RerankerConfig,
    /// Weight of the semantic ranking in RRF fusion.
    pub semantic_weight: f32,
    /// Weight of the lexical ranking in RRF fusion.
    pub bm25_weight: f32,
    /// RRF rank constant.
    pub rrf_k: f32,
    /// Minimum rerank relevance to keep a result.
    pub min_relevance: f32,
    /// Budget for the whole request; vector and rerank calls run inside it.
    pub request_timeout_secs: u64,
    /// Importance cache bounds (entries are whole repos).
    pub importance_cache_max_repos: usize,
    /// Importance entries older than this are recomputed on next use.
    pub importance_cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            reranker: RerankerConfig::default(),
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            bm25_weight: DEFAULT_BM25_WEIGHT,
            rrf_k: DEFAULT_RRF_K,
            min_relevance: DEFAULT_MIN_RELEVANCE,
            request_timeout_secs: 30,
            importance_cache_max_repos: 64,
            importance_cache_ttl_secs: 15 * 60,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.embedding = EmbeddingConfig::from_env();
        config.reranker = RerankerConfig::from_env();

        if let Ok(val) = std::env::var("SEARCH_SEMANTIC_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.semantic_weight = v;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_BM25_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.bm25_weight = v;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.request_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("SEARCH_IMPORTANCE_CACHE_TTL_SECS") {
            if let Ok(v) = val.parse() {
                config.importance_cache_ttl_secs = v;
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Which embedding backend to construct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "voyage", "openai", or "auto" (prefer the code-specialized backend,
    /// fall back to the general-purpose one).
    pub provider: String,
    pub voyage_api_key: Option<String>,
    pub voyage_base_url: String,
    pub voyage_model: String,
    /// Voyage supports reduced output dimensions; 1024 is the default.
    pub voyage_dimension: usize,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            voyage_api_key: None,
            voyage_base_url: "https://api.voyageai.com".to_string(),
            voyage_model: "voyage-code-3".to_string(),
            voyage_dimension: 1024,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            openai_model: "text-embedding-3-small".to_string(),
        }
    }
}

impl EmbeddingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(key) = std::env::var("VOYAGE_API_KEY") {
            config.voyage_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("VOYAGE_BASE_URL") {
            config.voyage_base_url = url;
        }
        if let Ok(model) = std::env::var("VOYAGE_MODEL") {
            config.voyage_model = model;
        }
        if let Ok(val) = std::env::var("VOYAGE_DIMENSION") {
            if let Ok(v) = val.parse() {
                config.voyage_dimension = v;
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.openai_base_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_EMBEDDING_MODEL") {
            config.openai_model = model;
        }

        config
    }
}

/// Configuration for the cross-encoder reranker endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Base URL for the rerank API. If None, reranking is skipped and the
    /// pipeline keeps the fused/boosted order.
    pub base_url: Option<String>,
    /// Model name to send in the rerank request.
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Per-call timeout in seconds (capped at 30).
    pub timeout_secs: u64,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl RerankerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("RERANKER_BASE_URL") {
            config.base_url = Some(url);
        }
        if let Ok(model) = std::env::var("RERANKER_MODEL") {
            config.model = Some(model);
        }
        if let Ok(key) = std::env::var("RERANKER_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("RERANKER_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.timeout_secs = v.min(30); // Cap at 30s
            }
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }
}
