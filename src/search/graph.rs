//! Code-graph importance ranking.
//!
//! Converts a file dependency map into per-file importance scores, then uses
//! them to boost architecturally significant results and suppress test
//! files. Importance is cached per repo in a bounded TTL cache with an
//! explicit invalidation hook for when the dependency graph changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::models::{FileImportance, SearchCandidate};

use super::sort_candidates;

/// Multiplier applied to a test file's importance.
pub const TEST_FILE_PENALTY: f32 = 0.5;
/// Multiplier applied to core files (entry points, routes, services).
pub const CORE_FILE_BOOST: f32 = 1.3;
/// Multiplier for files at least [`HIGH_DEPENDENCY_THRESHOLD`] files depend on.
pub const HIGH_DEPENDENCY_BOOST: f32 = 1.5;
pub const HIGH_DEPENDENCY_THRESHOLD: usize = 5;

static TEST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"test[s]?[/_]",      // test/, tests/, test_
        r"[/_]test[s]?\.py$", // _test.py, _tests.py
        r"\.test\.[jt]sx?$",  // .test.js, .test.ts
        r"\.spec\.[jt]sx?$",  // .spec.js, .spec.ts
        r"__tests__",
        r"conftest\.py$",
        r"fixtures?[/_]",
        r"mock[s]?[/_]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("test pattern must compile"))
    .collect()
});

static CORE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"main\.[a-z]+$",
        r"index\.[a-z]+$",
        r"app\.[a-z]+$",
        r"server\.[a-z]+$",
        r"api\.[a-z]+$",
        r"routes?\.[a-z]+$",
        r"models?\.[a-z]+$",
        r"services?[/_]",
        r"controllers?[/_]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("core pattern must compile"))
    .collect()
});

/// True if the path looks like a test file, fixture, or mock.
pub fn is_test_file(file_path: &str) -> bool {
    let lower = file_path.to_lowercase();
    TEST_PATTERNS.iter().any(|p| p.is_match(&lower))
}

fn is_core_file(file_path: &str) -> bool {
    let lower = file_path.to_lowercase();
    CORE_PATTERNS.iter().any(|p| p.is_match(&lower))
}

struct CachedImportance {
    computed_at: Instant,
    map: Arc<HashMap<String, FileImportance>>,
}

/// Ranks results by code structure: reverse-dependency counts plus path
/// signals (test vs. core files).
pub struct CodeGraphRanker {
    cache: RwLock<HashMap<String, CachedImportance>>,
    max_repos: usize,
    ttl: Duration,
}

impl CodeGraphRanker {
    pub fn new(max_repos: usize, ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            max_repos,
            ttl,
        }
    }

    /// Importance scores for every file reachable in the dependency map,
    /// cached per repo until the TTL lapses or [`invalidate`] runs.
    ///
    /// [`invalidate`]: CodeGraphRanker::invalidate
    pub fn calculate_importance(
        &self,
        repo_id: &str,
        file_dependencies: &HashMap<String, Vec<String>>,
    ) -> Arc<HashMap<String, FileImportance>> {
        if let Some(cached) = self.cache.read().get(repo_id) {
            if cached.computed_at.elapsed() < self.ttl {
                return Arc::clone(&cached.map);
            }
        }

        // Compute outside the lock so two repos never serialize each other.
        let map = Arc::new(compute_importance(file_dependencies));

        let mut cache = self.cache.write();
        if cache.len() >= self.max_repos && !cache.contains_key(repo_id) {
            // Evict the stalest entry to stay bounded.
            if let Some(oldest) = cache
                .iter()
                .min_by_key(|(_, v)| v.computed_at)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest);
            }
        }
        cache.insert(
            repo_id.to_string(),
            CachedImportance {
                computed_at: Instant::now(),
                map: Arc::clone(&map),
            },
        );

        tracing::info!(
            repo_id,
            file_count = map.len(),
            test_files = map.values().filter(|f| f.is_test_file).count(),
            "calculated importance scores"
        );

        map
    }

    /// Drop cached importance for a repo; the next search recomputes it.
    /// Callers invoke this when the dependency graph changes.
    pub fn invalidate(&self, repo_id: &str) {
        self.cache.write().remove(repo_id);
    }

    /// Rescale every candidate's current score by its file's importance and
    /// re-sort. Test files are heavily penalized unless requested; files
    /// missing from the map get a mild unknown-file penalty instead.
    pub fn boost_results(
        &self,
        results: &mut [SearchCandidate],
        importance_map: &HashMap<String, FileImportance>,
        include_tests: bool,
    ) {
        for result in results.iter_mut() {
            let file_path = &result.function.file_path;
            let original_score = result.current_score;

            let new_score = match importance_map.get(file_path) {
                Some(importance) => {
                    let mut boost_factor = 0.5 + importance.importance_score * 0.5;
                    if importance.is_test_file && !include_tests {
                        boost_factor *= 0.3; // heavy penalty
                    }
                    result.importance_score = importance.importance_score;
                    result.is_test_file = importance.is_test_file;
                    original_score * boost_factor
                }
                None => {
                    // Unknown file: slight penalty, pattern check for tests.
                    result.is_test_file = is_test_file(file_path);
                    if result.is_test_file && !include_tests {
                        original_score * 0.3
                    } else {
                        original_score * 0.8
                    }
                }
            };

            result.current_score = new_score;
        }

        sort_candidates(results);
    }

    /// Hard-remove test files. The minimum viable filtering path when no
    /// dependency map is available.
    pub fn filter_test_files(
        &self,
        results: Vec<SearchCandidate>,
        include_tests: bool,
    ) -> Vec<SearchCandidate> {
        if include_tests {
            return results;
        }

        let original_count = results.len();
        let filtered: Vec<SearchCandidate> = results
            .into_iter()
            .filter(|r| !is_test_file(&r.function.file_path))
            .collect();

        tracing::debug!(
            original_count,
            filtered_count = filtered.len(),
            "filtered test files"
        );

        filtered
    }
}

/// The importance formula. For each file:
/// `score = 0.3 + 0.7 * dependents/max_dependents`, then test penalty, core
/// boost, and high-dependency boost, clamped to [0,1].
fn compute_importance(
    file_dependencies: &HashMap<String, Vec<String>>,
) -> HashMap<String, FileImportance> {
    // Reverse edge counts.
    let mut dependent_counts: HashMap<&str, usize> = HashMap::new();
    for deps in file_dependencies.values() {
        for dep in deps {
            *dependent_counts.entry(dep.as_str()).or_insert(0) += 1;
        }
    }

    let max_dependents = dependent_counts.values().copied().max().unwrap_or(1).max(1);

    // Files with only incoming edges still need a score.
    let all_files: std::collections::HashSet<&str> = file_dependencies
        .keys()
        .map(|s| s.as_str())
        .chain(dependent_counts.keys().copied())
        .collect();

    let mut importance_map = HashMap::with_capacity(all_files.len());
    for file_path in all_files {
        let is_test = is_test_file(file_path);
        let is_core = is_core_file(file_path);
        let dep_count = dependent_counts.get(file_path).copied().unwrap_or(0);

        let base_score = dep_count as f32 / max_dependents as f32;
        let mut score = 0.3 + base_score * 0.7;

        if is_test {
            score *= TEST_FILE_PENALTY;
        }
        if is_core {
            score *= CORE_FILE_BOOST;
        }
        if dep_count >= HIGH_DEPENDENCY_THRESHOLD {
            score *= HIGH_DEPENDENCY_BOOST;
        }

        importance_map.insert(
            file_path.to_string(),
            FileImportance {
                file_path: file_path.to_string(),
                importance_score: score.clamp(0.0, 1.0),
                dependent_count: dep_count,
                is_test_file: is_test,
                is_core_file: is_core,
            },
        );
    }

    importance_map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndexedFunction;

    fn deps(edges: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        edges
            .iter()
            .map(|(f, ds)| {
                (
                    f.to_string(),
                    ds.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    fn candidate(path: &str, score: f32) -> SearchCandidate {
        let mut c = SearchCandidate::new(
            IndexedFunction {
                name: path.trim_end_matches(".py").replace('/', "_"),
                qualified_name: path.to_string(),
                file_path: path.to_string(),
                language: "python".to_string(),
                code: String::new(),
                signature: String::new(),
                docstring: None,
                line_start: 1,
                line_end: 2,
                summary: None,
                class_name: None,
                is_async: false,
                is_method: false,
            },
            score,
        );
        c.current_score = score;
        c
    }

    fn ranker() -> CodeGraphRanker {
        CodeGraphRanker::new(16, Duration::from_secs(600))
    }

    #[test]
    fn test_test_file_detection() {
        assert!(is_test_file("tests/test_auth.py"));
        assert!(is_test_file("src/auth_test.py"));
        assert!(is_test_file("src/Button.spec.tsx"));
        assert!(is_test_file("src/__tests__/util.js"));
        assert!(is_test_file("conftest.py"));
        assert!(is_test_file("fixtures/users.json"));
        assert!(!is_test_file("src/auth.py"));
        assert!(!is_test_file("src/protest.py"));
    }

    #[test]
    fn test_importance_scenario_exact_values() {
        let ranker = ranker();
        let map = ranker.calculate_importance(
            "repo-1",
            &deps(&[
                ("main.py", &["auth.py", "db.py"]),
                ("auth.py", &["utils.py"]),
                ("db.py", &["utils.py"]),
                ("tests/test_auth.py", &["auth.py"]),
            ]),
        );

        let score = |f: &str| map[f].importance_score;
        assert!((score("utils.py") - 1.0).abs() < 1e-6);
        assert!((score("auth.py") - 1.0).abs() < 1e-6);
        assert!((score("db.py") - 0.65).abs() < 1e-6);
        // main.py: no dependents, core-file boost: 0.3 * 1.3
        assert!((score("main.py") - 0.39).abs() < 1e-6);
        // test file: 0.3 * 0.5
        assert!((score("tests/test_auth.py") - 0.15).abs() < 1e-6);

        assert_eq!(map["auth.py"].dependent_count, 2);
        assert!(map["tests/test_auth.py"].is_test_file);
        assert!(map["main.py"].is_core_file);
    }

    #[test]
    fn test_high_dependency_boost_and_clamp() {
        let ranker = ranker();
        let edges: Vec<(String, Vec<String>)> = (0..6)
            .map(|i| (format!("user_{i}.py"), vec!["hub.py".to_string()]))
            .collect();
        let map = ranker.calculate_importance("repo-boost", &edges.into_iter().collect());

        // hub.py: base 1.0 -> 1.0 * 1.5 boosted, clamped to 1.0
        assert_eq!(map["hub.py"].importance_score, 1.0);
        assert_eq!(map["hub.py"].dependent_count, 6);
    }

    #[test]
    fn test_importance_is_cached_and_invalidatable() {
        let ranker = ranker();
        let initial = deps(&[("a.py", &["b.py"])]);
        let first = ranker.calculate_importance("repo-c", &initial);

        // A different dependency map for the same repo returns the cached map.
        let changed = deps(&[("a.py", &["c.py"]), ("d.py", &["c.py"])]);
        let cached = ranker.calculate_importance("repo-c", &changed);
        assert!(Arc::ptr_eq(&first, &cached));

        ranker.invalidate("repo-c");
        let fresh = ranker.calculate_importance("repo-c", &changed);
        assert!(fresh.contains_key("c.py"));
    }

    #[test]
    fn test_cache_is_bounded() {
        let ranker = CodeGraphRanker::new(2, Duration::from_secs(600));
        let edges = deps(&[("a.py", &["b.py"])]);
        ranker.calculate_importance("r1", &edges);
        ranker.calculate_importance("r2", &edges);
        ranker.calculate_importance("r3", &edges);
        assert!(ranker.cache.read().len() <= 2);
    }

    #[test]
    fn test_boost_scenario_exact_values() {
        let ranker = ranker();
        let mut importance_map = HashMap::new();
        importance_map.insert(
            "tests/test_auth.py".to_string(),
            FileImportance {
                file_path: "tests/test_auth.py".to_string(),
                importance_score: 0.15,
                dependent_count: 0,
                is_test_file: true,
                is_core_file: false,
            },
        );

        let mut results = vec![candidate("tests/test_auth.py", 0.9)];
        ranker.boost_results(&mut results, &importance_map, false);

        // boost_factor = (0.5 + 0.15*0.5) * 0.3 = 0.1725
        assert!((results[0].current_score - 0.155_25).abs() < 1e-6);
        assert!(results[0].is_test_file);
    }

    #[test]
    fn test_boosted_test_file_ranks_below_modest_non_test() {
        let ranker = ranker();
        let mut importance_map = HashMap::new();
        importance_map.insert(
            "tests/test_auth.py".to_string(),
            FileImportance {
                file_path: "tests/test_auth.py".to_string(),
                importance_score: 0.15,
                dependent_count: 0,
                is_test_file: true,
                is_core_file: false,
            },
        );
        importance_map.insert(
            "auth.py".to_string(),
            FileImportance {
                file_path: "auth.py".to_string(),
                importance_score: 1.0,
                dependent_count: 2,
                is_test_file: false,
                is_core_file: false,
            },
        );

        let mut results = vec![
            candidate("tests/test_auth.py", 0.9),
            candidate("auth.py", 0.156),
        ];
        ranker.boost_results(&mut results, &importance_map, false);

        assert_eq!(results[0].function.file_path, "auth.py");
    }

    #[test]
    fn test_unknown_files_get_neutral_penalty() {
        let ranker = ranker();
        let importance_map = HashMap::new();

        let mut results = vec![
            candidate("unknown.py", 1.0),
            candidate("tests/test_unknown.py", 1.0),
        ];
        ranker.boost_results(&mut results, &importance_map, false);

        let by_path: HashMap<&str, f32> = results
            .iter()
            .map(|r| (r.function.file_path.as_str(), r.current_score))
            .collect();
        assert!((by_path["unknown.py"] - 0.8).abs() < 1e-6);
        assert!((by_path["tests/test_unknown.py"] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_include_tests_skips_test_penalty() {
        let ranker = ranker();
        let importance_map = HashMap::new();

        let mut results = vec![candidate("tests/test_x.py", 1.0)];
        ranker.boost_results(&mut results, &importance_map, true);
        assert!((results[0].current_score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_filter_test_files_hard_removes() {
        let ranker = ranker();
        let results = vec![
            candidate("src/auth.py", 0.9),
            candidate("tests/test_auth.py", 0.8),
        ];

        let filtered = ranker.filter_test_files(results.clone(), false);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].function.file_path, "src/auth.py");

        let kept = ranker.filter_test_files(results, true);
        assert_eq!(kept.len(), 2);
    }
}
