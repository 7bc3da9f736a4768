//! The search orchestrator: sequences query understanding, hybrid
//! retrieval, code-graph boosting, and reranking per request.
//!
//! Stateless per request; the only state that outlives a request is the
//! importance cache inside [`CodeGraphRanker`]. All collaborators are
//! injected at construction, so there is no hidden global to configure.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::SearchError;
use crate::models::{QueryAnalysis, SearchCandidate, SearchConfig, SearchResult};
use crate::query::QueryUnderstanding;
use crate::rerank::{RerankOutcome, Reranker};
use crate::search::graph::{self, CodeGraphRanker};
use crate::search::vector::VectorStore;
use crate::search::{bm25, fusion};

pub struct SearchEngine {
    config: EngineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    query_understanding: QueryUnderstanding,
    graph_ranker: CodeGraphRanker,
    reranker: Reranker,
}

impl SearchEngine {
    pub fn new(
        config: EngineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        let graph_ranker = CodeGraphRanker::new(
            config.importance_cache_max_repos,
            std::time::Duration::from_secs(config.importance_cache_ttl_secs),
        );
        let reranker = Reranker::new(client, config.reranker.clone(), config.min_relevance);

        tracing::info!(
            embedding_model = embedder.model_name(),
            reranking_enabled = reranker.is_configured(),
            "search engine initialized"
        );

        Self {
            config,
            embedder,
            store,
            query_understanding: QueryUnderstanding::new(),
            graph_ranker,
            reranker,
        }
    }

    /// Analyze a query without searching.
    pub fn analyze_query(&self, query: &str) -> QueryAnalysis {
        self.query_understanding.analyze(query)
    }

    /// Drop cached importance scores for a repo. Call after the dependency
    /// graph changes so the next search recomputes them.
    pub fn invalidate_importance(&self, repo_id: &str) {
        self.graph_ranker.invalidate(repo_id);
    }

    /// Run the full pipeline and return at most `config.top_k` results.
    ///
    /// Zero candidates is an empty list, not an error. A reranker failure
    /// degrades to the fused/boosted order. Embedding or vector-store
    /// failures, and blowing the request budget, abort the search.
    pub async fn search(
        &self,
        query: &str,
        repo_id: &str,
        dependency_map: Option<&HashMap<String, Vec<String>>>,
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let analysis = self.query_understanding.analyze(query);

        // The query can opt tests back in even when the config excludes them.
        let include_tests = config.include_tests || analysis.should_include_tests;

        let search_query = if config.use_query_expansion {
            analysis.expanded_query.as_str()
        } else {
            query
        };
        let pool_size = if config.use_reranking {
            config.rerank_pool_size
        } else {
            config.top_k
        };

        // Retrieval is fatal on timeout: a partially fused ranking is
        // meaningless, so the whole request aborts.
        let budget = self.config.request_timeout();
        let mut candidates = tokio::time::timeout(
            budget,
            self.hybrid_search(search_query, query, repo_id, pool_size),
        )
        .await
        .map_err(|_| SearchError::Timeout(budget))??;

        if candidates.is_empty() {
            tracing::info!(query, repo_id, "no results found");
            return Ok(Vec::new());
        }

        // Code-graph boosting when a dependency map is available; otherwise
        // the minimum viable path is a hard test filter.
        match (config.use_code_graph, dependency_map) {
            (true, Some(deps)) => {
                let importance = self.graph_ranker.calculate_importance(repo_id, deps);
                self.graph_ranker
                    .boost_results(&mut candidates, &importance, include_tests);
            }
            _ => {
                candidates = self.graph_ranker.filter_test_files(candidates, include_tests);
            }
        }

        let mut rerank_outcome = RerankOutcome::Skipped {
            reason: "disabled".to_string(),
        };
        if config.use_reranking && self.reranker.is_configured() && candidates.len() > 1 {
            // Rerank against the raw query: expansion variants help recall,
            // not pairwise relevance judgment.
            rerank_outcome = self.reranker.rerank(query, &mut candidates).await;
            if rerank_outcome.was_applied() {
                // The reranker has no notion of test-file preference.
                candidates = self.graph_ranker.filter_test_files(candidates, include_tests);
            }
        }

        candidates.truncate(config.top_k);

        tracing::info!(
            query = %query.chars().take(50).collect::<String>(),
            intent = analysis.intent.as_str(),
            result_count = candidates.len(),
            include_tests,
            reranking_used = rerank_outcome.was_applied(),
            "search complete"
        );

        Ok(candidates.iter().map(SearchResult::from).collect())
    }

    /// Hybrid retrieval: semantic nearest neighbors, lexical scoring over
    /// the same candidates, weighted RRF fusion.
    async fn hybrid_search(
        &self,
        search_query: &str,
        original_query: &str,
        repo_id: &str,
        pool_size: usize,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let query_embedding = self.embedder.embed_query(search_query).await?;

        let matches = self.store.query(&query_embedding, pool_size, repo_id).await?;

        let mut candidates: Vec<SearchCandidate> = matches
            .into_iter()
            .map(|m| {
                let mut candidate = SearchCandidate::new(m.function, m.score);
                candidate.is_test_file = graph::is_test_file(&candidate.function.file_path);
                candidate
            })
            .collect();

        if candidates.is_empty() {
            return Ok(candidates);
        }

        // Lexical scoring uses the raw query: expansion terms would dilute
        // exact-identifier overlap, which is the whole point of this stage.
        bm25::score_candidates(original_query, &mut candidates);
        fusion::rrf_fuse(
            &mut candidates,
            self.config.semantic_weight,
            self.config.bm25_weight,
            self.config.rrf_k,
        );

        Ok(candidates)
    }
}
