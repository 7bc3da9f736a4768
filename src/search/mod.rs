//! Retrieval stages: vector store contract, lexical scoring, rank fusion,
//! and code-graph importance ranking.

pub mod bm25;
pub mod fusion;
pub mod graph;
pub mod vector;

use std::cmp::Ordering;

use crate::models::SearchCandidate;

/// Sort candidates by `current_score` descending with a fully deterministic
/// tie-break: `file_path` ascending, then `name` ascending. Every stage that
/// reorders candidates goes through this so the final ranking never depends
/// on sort stability or hash order.
pub(crate) fn sort_candidates(candidates: &mut [SearchCandidate]) {
    candidates.sort_by(|a, b| {
        b.current_score
            .partial_cmp(&a.current_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.function.file_path.cmp(&b.function.file_path))
            .then_with(|| a.function.name.cmp(&b.function.name))
    });
}
