//! Cross-encoder reranking over the fused candidate pool.
//!
//! Talks to an OpenAI-compatible `/v1/rerank` endpoint. Candidates are
//! formatted as field-labeled structured documents; cross-encoders score
//! those measurably better than raw code. Failure never fails the search:
//! every error path returns [`RerankOutcome::Skipped`] and the caller keeps
//! the pre-rerank order.

use serde::{Deserialize, Serialize};

use crate::config::RerankerConfig;
use crate::models::SearchCandidate;

/// Code snippet length inside a rerank document.
const MAX_DOC_CODE_CHARS: usize = 400;

/// Whether reranking actually ran, so callers can observe degraded mode
/// instead of inferring it from exceptions.
#[derive(Debug, Clone, PartialEq)]
pub enum RerankOutcome {
    /// Scores applied; `dropped` candidates fell below the relevance floor.
    Applied { scored: usize, dropped: usize },
    /// Stage skipped; candidates keep their previous order.
    Skipped { reason: String },
}

impl RerankOutcome {
    pub fn was_applied(&self) -> bool {
        matches!(self, RerankOutcome::Applied { .. })
    }
}

pub struct Reranker {
    client: reqwest::Client,
    config: RerankerConfig,
    min_relevance: f32,
}

impl Reranker {
    pub fn new(client: reqwest::Client, config: RerankerConfig, min_relevance: f32) -> Self {
        Self {
            client,
            config,
            min_relevance,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Rerank candidates in place against the query.
    ///
    /// On success the surviving candidates are reordered by relevance with
    /// `rerank_score` set and `current_score` overwritten. On any failure
    /// the input order is left untouched and the reason is reported.
    pub async fn rerank(&self, query: &str, candidates: &mut Vec<SearchCandidate>) -> RerankOutcome {
        let base_url = match self.config.base_url.as_deref() {
            Some(url) => url.trim_end_matches('/'),
            None => {
                return RerankOutcome::Skipped {
                    reason: "reranker not configured".to_string(),
                }
            }
        };

        if candidates.len() < 2 {
            return RerankOutcome::Skipped {
                reason: "fewer than two candidates".to_string(),
            };
        }

        let documents: Vec<String> = candidates.iter().map(format_document).collect();

        let req_body = RerankRequest {
            model: self.config.model.clone().unwrap_or_else(|| "default".to_string()),
            query: query.to_string(),
            documents,
            top_n: candidates.len(),
        };

        let timeout = std::time::Duration::from_secs(self.config.timeout_secs.min(30));
        let url = format!("{base_url}/v1/rerank");

        let mut request = self.client.post(&url).timeout(timeout).json(&req_body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "rerank call failed, keeping fused order");
                return RerankOutcome::Skipped {
                    reason: format!("request failed: {e}"),
                };
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, body, "reranker returned error, keeping fused order");
            return RerankOutcome::Skipped {
                reason: format!("reranker returned {status}"),
            };
        }

        let body: RerankResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "malformed rerank response, keeping fused order");
                return RerankOutcome::Skipped {
                    reason: format!("malformed response: {e}"),
                };
            }
        };

        self.apply(candidates, body)
    }

    /// Fold a rerank response into the candidate list: drop sub-threshold
    /// results, adopt relevance as the current score, order by it.
    fn apply(&self, candidates: &mut Vec<SearchCandidate>, body: RerankResponse) -> RerankOutcome {
        let mut results = body.results;
        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut reranked = Vec::with_capacity(candidates.len());
        let mut dropped = 0usize;

        for item in results {
            if item.index >= candidates.len() {
                continue; // backend returned an index we never sent
            }
            if item.relevance_score < self.min_relevance {
                dropped += 1;
                continue;
            }
            let mut candidate = candidates[item.index].clone();
            candidate.rerank_score = Some(item.relevance_score);
            candidate.current_score = item.relevance_score;
            reranked.push(candidate);
        }

        let scored = reranked.len();
        *candidates = reranked;

        tracing::info!(scored, dropped, "rerank applied");
        RerankOutcome::Applied { scored, dropped }
    }
}

/// Field-labeled document for one candidate.
fn format_document(candidate: &SearchCandidate) -> String {
    let f = &candidate.function;
    let file_name = f.file_path.rsplit('/').next().unwrap_or(&f.file_path);
    let kind = if f.class_name.is_some() && !f.is_method {
        "class"
    } else if f.is_method {
        "method"
    } else {
        "function"
    };
    let summary = f
        .summary
        .as_deref()
        .or(f.docstring.as_deref())
        .unwrap_or("N/A");

    let mut code = f.code.as_str();
    if code.len() > MAX_DOC_CODE_CHARS {
        let mut end = MAX_DOC_CODE_CHARS;
        while !code.is_char_boundary(end) {
            end -= 1;
        }
        code = &code[..end];
    }

    format!(
        "name: {}\ntype: {kind}\nfile: {file_name}\nqualified_name: {}\nsignature: {}\nsummary: {summary}\ncode: |\n  {}",
        f.name,
        f.qualified_name,
        f.signature,
        code.replace('\n', "\n  ")
    )
}

#[derive(Serialize)]
struct RerankRequest {
    model: String,
    query: String,
    documents: Vec<String>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResultRaw>,
}

#[derive(Deserialize)]
struct RerankResultRaw {
    index: usize,
    relevance_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MIN_RELEVANCE;
    use crate::models::IndexedFunction;

    fn candidate(name: &str, score: f32) -> SearchCandidate {
        let mut c = SearchCandidate::new(
            IndexedFunction {
                name: name.to_string(),
                qualified_name: format!("Mod.{name}"),
                file_path: format!("src/{name}.py"),
                language: "python".to_string(),
                code: format!("def {name}():\n    pass"),
                signature: format!("def {name}()"),
                docstring: Some("does a thing".to_string()),
                line_start: 1,
                line_end: 3,
                summary: None,
                class_name: None,
                is_async: false,
                is_method: false,
            },
            score,
        );
        c.fused_score = score;
        c.current_score = score;
        c
    }

    fn reranker(config: RerankerConfig) -> Reranker {
        Reranker::new(reqwest::Client::new(), config, DEFAULT_MIN_RELEVANCE)
    }

    #[tokio::test]
    async fn test_unconfigured_reranker_skips() {
        let r = reranker(RerankerConfig::default());
        let mut candidates = vec![candidate("a", 0.9), candidate("b", 0.8)];
        let before: Vec<String> = candidates.iter().map(|c| c.function.name.clone()).collect();

        let outcome = r.rerank("query", &mut candidates).await;
        assert!(!outcome.was_applied());

        let after: Vec<String> = candidates.iter().map(|c| c.function.name.clone()).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_single_candidate_skips() {
        let config = RerankerConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            ..Default::default()
        };
        let mut candidates = vec![candidate("only", 0.9)];
        let outcome = reranker(config).rerank("query", &mut candidates).await;
        assert_eq!(
            outcome,
            RerankOutcome::Skipped {
                reason: "fewer than two candidates".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_degrades_without_reordering() {
        // Port 1 refuses connections; the stage must degrade, not error.
        let config = RerankerConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            timeout_secs: 1,
            ..Default::default()
        };
        let mut candidates = vec![candidate("a", 0.9), candidate("b", 0.8)];

        let outcome = reranker(config).rerank("query", &mut candidates).await;
        assert!(!outcome.was_applied());
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].function.name, "a");
    }

    #[test]
    fn test_apply_reorders_and_drops_below_threshold() {
        let r = reranker(RerankerConfig::default());
        let mut candidates = vec![candidate("a", 0.9), candidate("b", 0.8), candidate("c", 0.7)];

        let outcome = r.apply(
            &mut candidates,
            RerankResponse {
                results: vec![
                    RerankResultRaw { index: 2, relevance_score: 0.9 },
                    RerankResultRaw { index: 0, relevance_score: 0.4 },
                    RerankResultRaw { index: 1, relevance_score: 0.001 },
                ],
            },
        );

        assert_eq!(outcome, RerankOutcome::Applied { scored: 2, dropped: 1 });
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].function.name, "c");
        assert_eq!(candidates[0].rerank_score, Some(0.9));
        assert_eq!(candidates[0].current_score, 0.9);
        assert_eq!(candidates[1].function.name, "a");
    }

    #[test]
    fn test_apply_ignores_out_of_range_indexes() {
        let r = reranker(RerankerConfig::default());
        let mut candidates = vec![candidate("a", 0.9), candidate("b", 0.8)];

        let outcome = r.apply(
            &mut candidates,
            RerankResponse {
                results: vec![
                    RerankResultRaw { index: 7, relevance_score: 0.9 },
                    RerankResultRaw { index: 0, relevance_score: 0.5 },
                ],
            },
        );

        assert_eq!(outcome, RerankOutcome::Applied { scored: 1, dropped: 0 });
        assert_eq!(candidates[0].function.name, "a");
    }

    #[test]
    fn test_document_format_is_field_labeled() {
        let doc = format_document(&candidate("login", 0.5));
        assert!(doc.starts_with("name: login\n"));
        assert!(doc.contains("type: function"));
        assert!(doc.contains("file: login.py"));
        assert!(doc.contains("signature: def login()"));
        assert!(doc.contains("summary: does a thing"));
        assert!(doc.contains("code: |"));
    }

    #[test]
    fn test_document_code_is_truncated() {
        let mut c = candidate("big", 0.5);
        c.function.code = "x".repeat(2_000);
        let doc = format_document(&c);
        // 400 chars of code plus labels; nowhere near the full snippet.
        assert!(doc.len() < 700);
    }
}
