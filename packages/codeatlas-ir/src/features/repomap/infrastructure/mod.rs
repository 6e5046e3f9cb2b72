//! RepoMap infrastructure

pub mod aggregator;
pub mod detectors;
pub mod file_store;
pub mod incremental;
pub mod metrics;
pub mod pagerank;
pub mod summarizer;
pub mod tree_builder;

pub use aggregator::{AggregationStrategy, NodeGraphBimap, PageRankAggregator};
pub use detectors::{EntrypointDetector, TestNodeDetector};
pub use file_store::{FileRepoMapStore, InMemoryRepoMapStore};
pub use incremental::{PageRankUpdateMode, RepoMapIncrementalUpdater};
pub use metrics::HeuristicMetricsCalculator;
pub use pagerank::{DegreeStats, GraphAdapter, GraphView, PageRankEngine, PageRankSettings};
pub use summarizer::{HierarchicalSummarizer, LlmSummarizer, SummaryCache};
pub use tree_builder::RepoMapTreeBuilder;
