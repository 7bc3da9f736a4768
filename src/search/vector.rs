//! Vector store contract and an in-memory cosine-similarity implementation.
//!
//! The engine only depends on the [`VectorStore`] trait; production deploys
//! point it at an external index, while [`InMemoryVectorStore`] backs tests
//! and small single-process setups.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::VectorStoreError;
use crate::models::IndexedFunction;

/// A nearest-neighbor match: similarity score plus the stored metadata.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub score: f32,
    pub function: IndexedFunction,
}

/// Nearest-neighbor search over embedded functions, filtered by repo.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        repo_id: &str,
    ) -> Result<Vec<VectorMatch>, VectorStoreError>;
}

#[derive(Debug, Clone)]
struct VectorEntry {
    repo_id: String,
    embedding: Vec<f32>,
    function: IndexedFunction,
}

/// In-memory store keyed by the deterministic vector id, so re-indexing the
/// same (repo, path, line) overwrites rather than duplicates.
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<Uuid, VectorEntry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite one function's vector.
    pub fn upsert(&self, repo_id: &str, function: IndexedFunction, embedding: Vec<f32>) {
        let id = function.vector_id(repo_id);
        self.entries.write().insert(
            id,
            VectorEntry {
                repo_id: repo_id.to_string(),
                embedding,
                function,
            },
        );
    }

    /// Remove every vector belonging to a repo.
    pub fn delete_repo(&self, repo_id: &str) {
        self.entries.write().retain(|_, e| e.repo_id != repo_id);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        repo_id: &str,
    ) -> Result<Vec<VectorMatch>, VectorStoreError> {
        let entries = self.entries.read();

        let mut scored: Vec<VectorMatch> = entries
            .values()
            .filter(|e| e.repo_id == repo_id)
            .map(|e| VectorMatch {
                score: cosine_similarity(vector, &e.embedding),
                function: e.function.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.function.file_path.cmp(&b.function.file_path))
                .then_with(|| a.function.name.cmp(&b.function.name))
        });
        scored.truncate(top_k);

        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(path: &str, name: &str, line: usize) -> IndexedFunction {
        IndexedFunction {
            name: name.to_string(),
            qualified_name: name.to_string(),
            file_path: path.to_string(),
            language: "python".to_string(),
            code: format!("def {name}(): ..."),
            signature: format!("def {name}()"),
            docstring: None,
            line_start: line,
            line_end: line + 5,
            summary: None,
            class_name: None,
            is_async: false,
            is_method: false,
        }
    }

    #[tokio::test]
    async fn test_query_ranks_by_cosine_similarity() {
        let store = InMemoryVectorStore::new();
        store.upsert("r1", function("db.py", "connect", 1), vec![0.9, 0.1, 0.1]);
        store.upsert("r1", function("http.py", "handle", 1), vec![0.1, 0.9, 0.1]);
        store.upsert("r1", function("main.py", "main", 1), vec![0.1, 0.1, 0.9]);

        let matches = store.query(&[0.95, 0.05, 0.05], 10, "r1").await.unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].function.file_path, "db.py");
    }

    #[tokio::test]
    async fn test_query_filters_by_repo() {
        let store = InMemoryVectorStore::new();
        store.upsert("r1", function("a.py", "a", 1), vec![1.0, 0.0]);
        store.upsert("r2", function("b.py", "b", 1), vec![1.0, 0.0]);

        let matches = store.query(&[1.0, 0.0], 10, "r2").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].function.file_path, "b.py");
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_location() {
        let store = InMemoryVectorStore::new();
        store.upsert("r1", function("a.py", "old_name", 10), vec![1.0, 0.0]);
        // Same (repo, path, line): re-index must overwrite, not duplicate.
        store.upsert("r1", function("a.py", "new_name", 10), vec![0.0, 1.0]);

        assert_eq!(store.entry_count(), 1);
        let matches = store.query(&[0.0, 1.0], 10, "r1").await.unwrap();
        assert_eq!(matches[0].function.name, "new_name");
    }

    #[tokio::test]
    async fn test_delete_repo_removes_only_that_repo() {
        let store = InMemoryVectorStore::new();
        store.upsert("r1", function("a.py", "a", 1), vec![1.0]);
        store.upsert("r2", function("b.py", "b", 1), vec![1.0]);

        store.delete_repo("r1");
        assert_eq!(store.entry_count(), 1);
        assert!(store.query(&[1.0], 10, "r1").await.unwrap().is_empty());
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
