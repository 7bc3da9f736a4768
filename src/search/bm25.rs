//! Lexical scoring over a candidate batch.
//!
//! Unlike a persisted full-text index, this scorer runs over the handful of
//! candidates the semantic stage already pulled: it builds a tiny per-query
//! corpus from each candidate's name, qualified name, signature, and
//! docstring/summary, then applies BM25 with code-aware tokenization.
//! Scores are normalized to [0,1] by the batch maximum so fusion sees a
//! stable scale.

use std::collections::HashMap;

use crate::models::SearchCandidate;

/// Standard Okapi parameters.
pub const BM25_K1: f32 = 1.2;
pub const BM25_B: f32 = 0.75;

/// Tokenize with CamelCase splitting: insert a boundary before an uppercase
/// letter that follows a lowercase one, then lowercase and split on
/// non-word characters. snake_case stays a single token.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut split = String::with_capacity(text.len() + 8);
    let mut prev_lower = false;
    for ch in text.chars() {
        if ch.is_uppercase() && prev_lower {
            split.push(' ');
        }
        prev_lower = ch.is_lowercase();
        split.push(ch);
    }

    split
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// The text BM25 sees for one candidate.
fn document_text(candidate: &SearchCandidate) -> String {
    let f = &candidate.function;
    let mut text = format!("{} {} {}", f.name, f.qualified_name, f.signature);
    if let Some(docstring) = &f.docstring {
        text.push(' ');
        text.push_str(docstring);
    }
    if let Some(summary) = &f.summary {
        text.push(' ');
        text.push_str(summary);
    }
    text
}

/// Score the query against every candidate and write normalized scores into
/// `bm25_score`. An all-zero batch stays all-zero.
pub fn score_candidates(query: &str, candidates: &mut [SearchCandidate]) {
    if candidates.is_empty() {
        return;
    }

    let corpus: Vec<Vec<String>> = candidates
        .iter()
        .map(|c| tokenize(&document_text(c)))
        .collect();
    let query_tokens = tokenize(query);

    let scores = bm25_scores(&query_tokens, &corpus);

    let max_score = scores.iter().cloned().fold(0.0f32, f32::max);
    for (candidate, score) in candidates.iter_mut().zip(scores) {
        candidate.bm25_score = if max_score > 0.0 { score / max_score } else { 0.0 };
    }
}

/// Raw Okapi BM25 over a tokenized corpus. Uses the `ln(1 + ...)` idf form
/// so scores stay non-negative even when a term hits most documents, which
/// happens constantly in batches this small.
fn bm25_scores(query_tokens: &[String], corpus: &[Vec<String>]) -> Vec<f32> {
    let n = corpus.len();
    if n == 0 || query_tokens.is_empty() {
        return vec![0.0; n];
    }

    let avgdl = corpus.iter().map(|d| d.len()).sum::<usize>() as f32 / n as f32;
    let avgdl = if avgdl > 0.0 { avgdl } else { 1.0 };

    // document frequency per query term
    let mut df: HashMap<&str, usize> = HashMap::new();
    for term in query_tokens {
        let count = corpus
            .iter()
            .filter(|doc| doc.iter().any(|t| t == term))
            .count();
        df.insert(term.as_str(), count);
    }

    corpus
        .iter()
        .map(|doc| {
            let doc_len = doc.len() as f32;
            let mut score = 0.0f32;
            for term in query_tokens {
                let tf = doc.iter().filter(|t| *t == term).count() as f32;
                if tf == 0.0 {
                    continue;
                }
                let dfv = df[term.as_str()] as f32;
                let idf = (1.0 + (n as f32 - dfv + 0.5) / (dfv + 0.5)).ln();
                let denom = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / avgdl);
                score += idf * tf * (BM25_K1 + 1.0) / denom;
            }
            score
        })
        .collect()
}
