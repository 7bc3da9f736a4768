//! Code-vocabulary synonym table used for query expansion.
//!
//! The table maps a common search term to the identifiers and phrasings it
//! tends to appear as in real codebases. Expansion appends, never replaces,
//! so recall improves without losing the original phrasing.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// term -> synonyms, ordered by how often they pay off in retrieval.
pub static CODE_SYNONYMS: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let entries: &[(&str, &[&str])] = &[
            // auth related
            (
                "auth",
                &["authentication", "authorize", "login", "credential", "token", "session"],
            ),
            ("authentication", &["auth", "login", "credential", "authenticate"]),
            ("login", &["auth", "authenticate", "sign_in", "signin"]),
            // data related
            (
                "json",
                &["JSONResponse", "json_response", "application/json", "serialize", "dump"],
            ),
            ("response", &["Response", "JSONResponse", "HTMLResponse", "return"]),
            ("request", &["Request", "http_request", "incoming"]),
            // error handling
            ("error", &["exception", "error_handler", "catch", "raise", "throw"]),
            ("exception", &["error", "raise", "catch", "try", "except"]),
            ("handle", &["handler", "process", "manage", "catch"]),
            // web related
            ("websocket", &["WebSocket", "ws", "socket", "realtime"]),
            (
                "middleware",
                &["Middleware", "dispatch", "before_request", "after_request"],
            ),
            ("route", &["router", "endpoint", "path", "url", "decorator"]),
            ("endpoint", &["route", "path", "api", "handler"]),
            // database
            ("database", &["db", "query", "sql", "orm", "model"]),
            ("query", &["select", "find", "filter", "where"]),
            // validation
            ("validate", &["validation", "validator", "check", "verify", "sanitize"]),
            ("validation", &["validate", "validator", "schema", "pydantic"]),
            // general patterns
            ("create", &["new", "init", "constructor", "build", "make"]),
            ("delete", &["remove", "destroy", "drop", "clear"]),
            ("update", &["modify", "change", "edit", "patch", "put"]),
            ("get", &["fetch", "retrieve", "find", "load", "read"]),
        ];
        entries.iter().copied().collect()
    });

/// How many synonyms a single term contributes to the expanded query.
pub const SYNONYMS_PER_TERM: usize = 3;
