//! Entrypoint and test detection for RepoMap nodes
//!
//! Whole-word patterns only, so "contain" never matches "main".

use once_cell::sync::Lazy;
use regex::Regex;

use crate::features::repomap::domain::RepoMapNode;

static PATH_ENTRYPOINT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bmain\b",
        r"\bcli\b",
        r"\bapp\b",
        r"\bserver\b",
        r"\brouter\b",
        r"\broutes\b",
        r"__main__",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

static FQN_ENTRYPOINT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bmain\b",
        r"\broute\b",
        r"\bendpoint\b",
        r"\bhandler\b",
        r"\bentrypoint\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

/// Detects entrypoint nodes (routes, main, CLI, servers)
pub struct EntrypointDetector;

impl EntrypointDetector {
    /// Mark entrypoint nodes in place
    pub fn detect(nodes: &mut [RepoMapNode]) {
        for node in nodes.iter_mut() {
            if Self::is_entrypoint(node) {
                node.is_entrypoint = true;
            }
        }
    }

    fn is_entrypoint(node: &RepoMapNode) -> bool {
        if let Some(path) = &node.path {
            let path = path.to_lowercase();
            if PATH_ENTRYPOINT_PATTERNS.iter().any(|p| p.is_match(&path)) {
                return true;
            }
        }
        if let Some(fqn) = &node.fqn {
            let fqn = fqn.to_lowercase();
            if FQN_ENTRYPOINT_PATTERNS.iter().any(|p| p.is_match(&fqn)) {
                return true;
            }
        }
        false
    }
}

/// Detects test nodes by path and FQN patterns
pub struct TestNodeDetector;

impl TestNodeDetector {
    /// Mark test nodes in place; nodes already flagged by the chunk layer
    /// stay flagged
    pub fn detect(nodes: &mut [RepoMapNode]) {
        for node in nodes.iter_mut() {
            if node.is_test {
                continue;
            }
            if Self::is_test(node) {
                node.is_test = true;
            }
        }
    }

    fn is_test(node: &RepoMapNode) -> bool {
        if let Some(path) = &node.path {
            if crate::features::chunking::infrastructure::TestDetector::is_test_path(path) {
                return true;
            }
        }
        if let Some(fqn) = &node.fqn {
            let last = fqn.rsplit('.').next().unwrap_or(fqn).to_lowercase();
            if last.starts_with("test_") || last.starts_with("fixture_") {
                return true;
            }
        }
        false
    }
}
