//! # code-brain
//!
//! The search core of a codebase intelligence service: it takes a natural
//! language question about a repository and returns the most relevant
//! indexed functions, combining semantic vector search, lexical BM25
//! scoring, code-graph importance, and optional cross-encoder reranking.
//!
//! ## Architecture
//!
//! Each search request flows through a fixed pipeline:
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │    User Query     │
//!                  └────────┬─────────┘
//!                           ▼
//!              ┌────────────────────────┐
//!              │  Query Understanding    │
//!              │  intent + code terms    │
//!              │  + synonym expansion    │
//!              └────────────┬───────────┘
//!                           ▼
//!              ┌────────────────────────┐
//!              │   Semantic Retrieval    │
//!              │  embed expanded query,  │
//!              │  top-N vector matches   │
//!              └────────────┬───────────┘
//!                           ▼
//!              ┌────────────────────────┐
//!              │  BM25 over Candidates   │
//!              │  raw query vs metadata  │
//!              └────────────┬───────────┘
//!                           ▼
//!              ┌────────────────────────┐
//!              │  Weighted RRF Fusion    │
//!              │  semantic 0.7 / lex 0.3 │
//!              └────────────┬───────────┘
//!                           ▼
//!              ┌────────────────────────┐
//!              │  Code-Graph Boosting    │
//!              │  importance rescaling,  │
//!              │  test-file handling     │
//!              └────────────┬───────────┘
//!                           ▼
//!              ┌────────────────────────┐
//!              │  Cross-Encoder Rerank   │
//!              │  (optional, degrades    │
//!              │   to fused order)       │
//!              └────────────┬───────────┘
//!                           ▼
//!                  ┌──────────────────┐
//!                  │   Top-K Results   │
//!                  └──────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for providers, weights, and timeouts
//! - [`models`] - Shared data types: `IndexedFunction`, `SearchCandidate`, `SearchResult`
//! - [`query`] - Intent classification, code-term extraction, synonym expansion
//! - [`embedding`] - Embedding provider trait with Voyage and OpenAI backends
//! - [`search::vector`] - Vector store contract and in-memory cosine-similarity store
//! - [`search::bm25`] - Candidate-batch BM25 with identifier-aware tokenization
//! - [`search::fusion`] - Weighted Reciprocal Rank Fusion with deterministic tie-breaks
//! - [`search::graph`] - Dependency-count importance scores and result boosting
//! - [`rerank`] - Cross-encoder reranking client with explicit degraded outcomes
//! - [`engine`] - The orchestrator wiring the stages into one request pipeline

pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod models;
pub mod query;
pub mod rerank;
pub mod search;

pub use config::EngineConfig;
pub use engine::SearchEngine;
pub use error::SearchError;
pub use models::{IndexedFunction, QueryIntent, SearchConfig, SearchResult};
