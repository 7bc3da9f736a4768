use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version folded into vector ids. Bump when the indexed metadata
/// layout changes so stale vectors stop colliding with fresh ones.
pub const INDEX_SCHEMA_VERSION: &str = "v3";

/// Maximum characters of code stored per indexed function.
pub const MAX_STORED_CODE_CHARS: usize = 1_500;

/// One indexed unit: a function, method, or class extracted from a repo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedFunction {
    pub name: String,
    /// Dotted name including the enclosing class, e.g. `Session.get`.
    pub qualified_name: String,
    pub file_path: String,
    pub language: String,
    /// Code snippet, capped at [`MAX_STORED_CODE_CHARS`] by the indexer.
    pub code: String,
    pub signature: String,
    pub docstring: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub summary: Option<String>,
    pub class_name: Option<String>,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_method: bool,
}

impl IndexedFunction {
    /// Deterministic vector id for this function within a repo.
    ///
    /// Derived from `(repo_id, file_path, line_start, schema version)` so
    /// re-indexing an unchanged location overwrites instead of duplicating.
    pub fn vector_id(&self, repo_id: &str) -> Uuid {
        let seed = format!(
            "{repo_id}:{}:{}:{INDEX_SCHEMA_VERSION}",
            self.file_path, self.line_start
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
    }

    /// Name to show in results: qualified when a class encloses this unit.
    pub fn display_name(&self) -> &str {
        if self.class_name.is_some() {
            &self.qualified_name
        } else {
            &self.name
        }
    }
}

/// Ephemeral per-query candidate carrying every stage's score.
///
/// Only `fused_score` is guaranteed populated once fusion has run. Later
/// stages rewrite `current_score`, which is what ordering uses.
#[derive(Debug, Clone)]
pub struct SearchCandidate {
    pub function: IndexedFunction,
    pub semantic_score: f32,
    pub bm25_score: f32,
    pub fused_score: f32,
    pub rerank_score: Option<f32>,
    pub importance_score: f32,
    pub is_test_file: bool,
    pub current_score: f32,
}

impl SearchCandidate {
    pub fn new(function: IndexedFunction, semantic_score: f32) -> Self {
        Self {
            function,
            semantic_score,
            bm25_score: 0.0,
            fused_score: 0.0,
            rerank_score: None,
            importance_score: 0.5,
            is_test_file: false,
            current_score: semantic_score,
        }
    }
}

/// What the user is trying to do with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// "where is auth handled", "find login"
    FindImplementation,
    /// "how does X work", "explain Y"
    ExplainCode,
    /// "how to use X", "examples of Y"
    FindUsage,
    /// "what is X", "define Y"
    FindDefinition,
    /// "why is X failing", "fix bug in Y"
    Debug,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::FindImplementation => "find",
            QueryIntent::ExplainCode => "explain",
            QueryIntent::FindUsage => "usage",
            QueryIntent::FindDefinition => "definition",
            QueryIntent::Debug => "debug",
        }
    }
}

/// Result of analyzing a single query.
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    pub original_query: String,
    pub intent: QueryIntent,
    pub expanded_query: String,
    pub keywords: Vec<String>,
    pub code_terms: Vec<String>,
    pub should_include_tests: bool,
    pub confidence: f32,
}

/// Importance metrics for one file, computed from the dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileImportance {
    pub file_path: String,
    /// 0-1, higher = more architecturally significant.
    pub importance_score: f32,
    /// How many files depend on this one (reverse edge count).
    pub dependent_count: usize,
    pub is_test_file: bool,
    pub is_core_file: bool,
}

/// Request-scoped search configuration. Immutable once built.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub top_k: usize,
    pub include_tests: bool,
    pub use_reranking: bool,
    pub use_query_expansion: bool,
    pub use_code_graph: bool,
    /// How many candidates to pull from retrieval when reranking is on.
    pub rerank_pool_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            include_tests: false,
            use_reranking: true,
            use_query_expansion: true,
            use_code_graph: true,
            rerank_pool_size: 50,
        }
    }
}

/// Final result returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub qualified_name: String,
    pub file_path: String,
    pub code: String,
    pub signature: String,
    pub language: String,
    pub score: f32,
    pub line_start: usize,
    pub line_end: usize,
    pub summary: Option<String>,
    pub class_name: Option<String>,
    pub is_test_file: bool,
}

impl From<&SearchCandidate> for SearchResult {
    fn from(c: &SearchCandidate) -> Self {
        let f = &c.function;
        Self {
            name: f.name.clone(),
            qualified_name: f.qualified_name.clone(),
            file_path: f.file_path.clone(),
            code: f.code.clone(),
            signature: f.signature.clone(),
            language: f.language.clone(),
            score: c.current_score,
            line_start: f.line_start,
            line_end: f.line_end,
            summary: f.summary.clone(),
            class_name: f.class_name.clone(),
            is_test_file: c.is_test_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_function() -> IndexedFunction {
        IndexedFunction {
            name: "get_user".to_string(),
            qualified_name: "Session.get_user".to_string(),
            file_path: "src/session.py".to_string(),
            language: "python".to_string(),
            code: "def get_user(self): ...".to_string(),
            signature: "def get_user(self)".to_string(),
            docstring: Some("Fetch the current user".to_string()),
            line_start: 42,
            line_end: 50,
            summary: None,
            class_name: Some("Session".to_string()),
            is_async: false,
            is_method: true,
        }
    }

    #[test]
    fn test_vector_id_is_deterministic() {
        let f = sample_function();
        assert_eq!(f.vector_id("repo-1"), f.vector_id("repo-1"));
    }

    #[test]
    fn test_vector_id_changes_with_repo_and_location() {
        let f = sample_function();
        let mut moved = sample_function();
        moved.line_start = 43;

        assert_ne!(f.vector_id("repo-1"), f.vector_id("repo-2"));
        assert_ne!(f.vector_id("repo-1"), moved.vector_id("repo-1"));
    }

    #[test]
    fn test_vector_id_ignores_code_changes_at_same_location() {
        // Re-indexing the same (repo, path, line) must overwrite, so the id
        // cannot depend on the snippet body.
        let f = sample_function();
        let mut edited = sample_function();
        edited.code = "def get_user(self): return self.user".to_string();
        assert_eq!(f.vector_id("repo-1"), edited.vector_id("repo-1"));
    }

    #[test]
    fn test_display_name_prefers_qualified_for_methods() {
        let f = sample_function();
        assert_eq!(f.display_name(), "Session.get_user");

        let mut free = sample_function();
        free.class_name = None;
        assert_eq!(free.display_name(), "get_user");
    }

    #[test]
    fn test_intent_serializes_to_snake_case() {
        let json = serde_json::to_value(QueryIntent::FindImplementation).unwrap();
        assert_eq!(json, "find_implementation");
    }
}
