//! Weighted Reciprocal Rank Fusion of the semantic and lexical rankings.
//!
//! RRF combines rankings through `weight / (k + rank + 1)` contributions
//! instead of averaging raw scores, so the two sub-rankings never need
//! comparable scales and a candidate missing from one ranking still keeps
//! the other's contribution.

use std::cmp::Ordering;

use crate::models::SearchCandidate;

use super::sort_candidates;

/// Fuse `semantic_score` and `bm25_score` rankings into `fused_score`, then
/// order candidates by it (deterministic tie-breaks).
///
/// Ranks are 0-based over descending score; a candidate at rank `r` in a
/// sub-ranking contributes `weight / (k + r + 1)`. A candidate ranked first
/// in both sub-rankings therefore holds the highest possible fused score.
pub fn rrf_fuse(
    candidates: &mut [SearchCandidate],
    semantic_weight: f32,
    bm25_weight: f32,
    k: f32,
) {
    let semantic_ranks = ranks_by(candidates, |c| c.semantic_score);
    let bm25_ranks = ranks_by(candidates, |c| c.bm25_score);

    for (i, candidate) in candidates.iter_mut().enumerate() {
        let semantic_contribution = semantic_weight / (k + semantic_ranks[i] as f32 + 1.0);
        let bm25_contribution = bm25_weight / (k + bm25_ranks[i] as f32 + 1.0);
        candidate.fused_score = semantic_contribution + bm25_contribution;
        candidate.current_score = candidate.fused_score;
    }

    sort_candidates(candidates);
}

/// 0-based rank of each candidate under `key` descending. Ties inside a
/// sub-ranking break by file path then name, same as the final ordering.
fn ranks_by<F>(candidates: &[SearchCandidate], key: F) -> Vec<usize>
where
    F: Fn(&SearchCandidate) -> f32,
{
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        key(&candidates[b])
            .partial_cmp(&key(&candidates[a]))
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                candidates[a]
                    .function
                    .file_path
                    .cmp(&candidates[b].function.file_path)
            })
            .then_with(|| candidates[a].function.name.cmp(&candidates[b].function.name))
    });

    let mut ranks = vec![0; candidates.len()];
    for (rank, &idx) in order.iter().enumerate() {
        ranks[idx] = rank;
    }
    ranks
}
