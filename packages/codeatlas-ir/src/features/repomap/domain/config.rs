//! RepoMap build configuration

use serde::{Deserialize, Serialize};

/// Configuration for RepoMap building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMapBuildConfig {
    // Heuristic weights
    pub heuristic_loc_weight: f64,
    pub heuristic_symbol_weight: f64,
    pub heuristic_edge_weight: f64,

    // PageRank
    pub pagerank_enabled: bool,
    pub pagerank_damping: f64,
    pub pagerank_max_iterations: usize,
    /// Include INHERITS edges in the PageRank graph view
    pub pagerank_include_inherits: bool,
    /// Include REFERENCES_TYPE edges in the PageRank graph view
    pub pagerank_include_references: bool,

    // Summaries
    pub summary_enabled: bool,
    /// Flat-mode selection: top N% by importance
    pub summary_top_percent: f64,
    pub summary_always_entrypoints: bool,
    /// Bottom-up hierarchical summaries instead of flat selection
    pub use_hierarchical_summary: bool,
    /// Cap on children per aggregation prompt
    pub hierarchical_max_children: usize,

    // Filtering
    pub include_tests: bool,
    pub min_loc: usize,
    pub max_depth: usize,

    // Boosts
    pub entrypoint_boost: f64,
    pub test_penalty: f64,

    // Chunk layer
    pub span_drift_threshold: u32,
}

impl Default for RepoMapBuildConfig {
    fn default() -> Self {
        Self {
            heuristic_loc_weight: 0.3,
            heuristic_symbol_weight: 0.4,
            heuristic_edge_weight: 0.3,
            pagerank_enabled: true,
            pagerank_damping: 0.85,
            pagerank_max_iterations: 20,
            pagerank_include_inherits: false,
            pagerank_include_references: false,
            summary_enabled: false,
            summary_top_percent: 0.2,
            summary_always_entrypoints: true,
            use_hierarchical_summary: true,
            hierarchical_max_children: 15,
            include_tests: false,
            min_loc: 10,
            max_depth: 10,
            entrypoint_boost: 1.5,
            test_penalty: 0.5,
            span_drift_threshold: 10,
        }
    }
}
