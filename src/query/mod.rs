//! Query understanding: intent classification, keyword and code-term
//! extraction, and synonym-based expansion.
//!
//! All pattern tables compile once at first use; analysis itself is pure
//! string work with no I/O.

pub mod synonyms;

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{QueryAnalysis, QueryIntent};
use synonyms::{CODE_SYNONYMS, SYNONYMS_PER_TERM};

/// Per-intent pattern sets, matched against the lowercased query.
static INTENT_PATTERNS: Lazy<Vec<(QueryIntent, Vec<Regex>)>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("intent pattern must compile"))
            .collect()
    };

    vec![
        (
            QueryIntent::ExplainCode,
            compile(&[
                r"\bhow\s+(does|do|is|are)\b",
                r"\bexplain\b",
                r"\bwhat\s+(does|is|are)\b",
                r"\bunderstand\b",
                r"\bdescribe\b",
            ]),
        ),
        (
            QueryIntent::FindUsage,
            compile(&[
                r"\bhow\s+to\b",
                r"\bexamples?\b",
                r"\buse\s+case\b",
                r"\busage\b",
                r"\bdemonstrat",
            ]),
        ),
        (
            QueryIntent::FindDefinition,
            compile(&[
                r"\bdefin(e|ition)\b",
                r"\bwhat\s+is\b",
                r"^where\s+is\b",
                r"\bclass\s+for\b",
                r"\bfunction\s+for\b",
            ]),
        ),
        (
            QueryIntent::Debug,
            compile(&[
                r"\bfix\b",
                r"\bbug\b",
                r"\berror\b",
                r"\bfail",
                r"\bwhy\s+(is|does|do)\b",
                r"\bnot\s+working\b",
                r"\bissue\b",
            ]),
        ),
    ]
});

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\b").expect("word pattern must compile"));

static CAMEL_CASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)+\b").expect("pattern must compile"));

static SNAKE_CASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z]+(?:_[a-z]+)+\b").expect("pattern must compile"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "how", "what", "where",
        "when", "why", "which", "who", "do", "does", "did", "doing", "done", "to", "for", "from",
        "in", "on", "at", "by", "with", "this", "that", "these", "those", "it", "its", "can",
        "could", "would", "should", "will", "might", "and", "or", "but", "if", "then", "else",
        "i", "me", "my", "we", "our", "you", "your", "find", "show", "get", "give", "tell",
        "explain",
    ]
    .into_iter()
    .collect()
});

/// Query fragments that mean the user actually wants test files back.
const TEST_INCLUDE_TERMS: &[&str] = &["test", "testing", "spec", "mock", "fixture", "example"];

/// Analyzes user queries for intent and expands them for better recall.
#[derive(Debug, Default)]
pub struct QueryUnderstanding;

impl QueryUnderstanding {
    pub fn new() -> Self {
        Self
    }

    /// Analyze a query: classify intent, pull out keywords and code terms,
    /// and build the expanded query string.
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let query_lower = query.trim().to_lowercase();

        let (intent, confidence) = detect_intent(&query_lower);
        let keywords = extract_keywords(&query_lower);
        // Run code-term extraction on the original casing so CamelCase survives.
        let code_terms = extract_code_terms(query);
        let expanded_query = expand_query(&query_lower, &code_terms);
        let should_include_tests = TEST_INCLUDE_TERMS.iter().any(|t| query_lower.contains(t));

        let analysis = QueryAnalysis {
            original_query: query.to_string(),
            intent,
            expanded_query,
            keywords,
            code_terms,
            should_include_tests,
            confidence,
        };

        tracing::debug!(
            intent = analysis.intent.as_str(),
            expanded = %analysis.expanded_query.chars().take(100).collect::<String>(),
            include_tests = analysis.should_include_tests,
            "query analyzed"
        );

        analysis
    }
}

/// Score every intent's pattern set and take the unique highest scorer.
///
/// An all-zero scoreboard, or a tie at the top, falls back to
/// FindImplementation at 0.5 so the outcome never depends on table order.
fn detect_intent(query: &str) -> (QueryIntent, f32) {
    let mut best: Option<(QueryIntent, usize)> = None;
    let mut tied = false;

    for (intent, patterns) in INTENT_PATTERNS.iter() {
        let score = patterns.iter().filter(|p| p.is_match(query)).count();
        match best {
            Some((_, top)) if score > top => {
                best = Some((*intent, score));
                tied = false;
            }
            Some((_, top)) if score == top && score > 0 => tied = true,
            None if score > 0 => best = Some((*intent, score)),
            _ => {}
        }
    }

    match best {
        Some((intent, score)) if !tied => {
            let confidence = (score as f32 / 2.0).min(1.0);
            (intent, confidence)
        }
        _ => (QueryIntent::FindImplementation, 0.5),
    }
}

/// Word-boundary tokens minus stop words and anything two chars or shorter.
fn extract_keywords(query: &str) -> Vec<String> {
    WORD_RE
        .find_iter(query)
        .map(|m| m.as_str().to_string())
        .filter(|w| !STOP_WORDS.contains(w.as_str()) && w.len() > 2)
        .collect()
}

/// CamelCase and snake_case tokens plus any synonym-table key present in the
/// query, deduplicated preserving first-seen order.
fn extract_code_terms(query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    let mut push = |term: String| {
        if seen.insert(term.to_lowercase()) {
            terms.push(term);
        }
    };

    for m in CAMEL_CASE_RE.find_iter(query) {
        push(m.as_str().to_string());
    }
    for m in SNAKE_CASE_RE.find_iter(query) {
        push(m.as_str().to_string());
    }
    // Known vocabulary counts as a code term even without casing hints.
    // Iterate the word list, not the map, to keep ordering deterministic.
    for m in WORD_RE.find_iter(&query_lower) {
        if CODE_SYNONYMS.contains_key(m.as_str()) {
            push(m.as_str().to_string());
        }
    }

    terms
}

/// Append top synonyms for each recognized term to the query. The result is
/// a superset of the original query, deduplicated case-insensitively while
/// preserving first-seen order.
fn expand_query(query: &str, code_terms: &[String]) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut parts: Vec<String> = Vec::new();

    let mut push = |part: &str| {
        if seen.insert(part.to_lowercase()) {
            parts.push(part.to_string());
        }
    };

    push(query);

    for term in code_terms {
        if let Some(synonyms) = CODE_SYNONYMS.get(term.to_lowercase().as_str()) {
            for syn in synonyms.iter().take(SYNONYMS_PER_TERM) {
                push(syn);
            }
        }
    }

    // Bare keywords that happen to be synonym keys expand too.
    for word in query.split_whitespace() {
        if let Some(synonyms) = CODE_SYNONYMS.get(word) {
            for syn in synonyms.iter().take(SYNONYMS_PER_TERM) {
                push(syn);
            }
        }
    }

    parts.join(" ")
}
