//! RepoMap build orchestration
//!
//! Full pipeline over one snapshot's chunks:
//! 1. Tree build (with dir synthesis and metric aggregation)
//! 2. Entrypoint and test detection
//! 3. Config-driven filtering
//! 4. PageRank + degree aggregation (full or incremental)
//! 5. Git change-frequency annotation
//! 6. Heuristic importance, boosts and penalties
//! 7. Optional summaries (hierarchical bottom-up, or flat legacy)
//! 8. Snapshot persistence

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::{AtlasError, Result};
use crate::features::chunking::domain::{Chunk, ChunkRefreshResult, ChunkToGraph};
use crate::features::chunking::ports::ChunkStore;
use crate::features::git_history::domain::FileStats;
use crate::features::graph_builder::domain::GraphDocument;
use crate::features::repomap::domain::{RepoMapBuildConfig, RepoMapNode, RepoMapSnapshot};
use crate::features::repomap::infrastructure::{
    EntrypointDetector, HeuristicMetricsCalculator, HierarchicalSummarizer, LlmSummarizer,
    PageRankAggregator, RepoMapIncrementalUpdater, RepoMapTreeBuilder, TestNodeDetector,
};
use crate::features::repomap::infrastructure::pagerank::{
    GraphAdapter, PageRankEngine, PageRankSettings,
};
use crate::features::repomap::infrastructure::summarizer::{
    CostController, InMemorySummaryCache, SummaryCostConfig,
};
use crate::features::repomap::ports::RepoMapStore;
use crate::shared::ports::LlmPort;

/// Input to one RepoMap build
pub struct RepoMapBuildInput<'a> {
    pub repo_id: &'a str,
    pub snapshot_id: &'a str,
    pub chunks: &'a [Chunk],
    pub chunk_to_graph: &'a ChunkToGraph,
    pub graph: Option<&'a GraphDocument>,
    /// Per-file git stats for change_freq annotation
    pub file_stats: Option<&'a HashMap<String, FileStats>>,
}

pub struct RepoMapBuilder {
    store: Arc<dyn RepoMapStore>,
    config: RepoMapBuildConfig,
    llm: Option<Arc<dyn LlmPort>>,
    chunk_store: Option<Arc<dyn ChunkStore>>,
}

impl RepoMapBuilder {
    pub fn new(store: Arc<dyn RepoMapStore>, config: RepoMapBuildConfig) -> Self {
        Self {
            store,
            config,
            llm: None,
            chunk_store: None,
        }
    }

    /// Attach the LLM and chunk store used for summaries
    pub fn with_summarizer(
        mut self,
        llm: Arc<dyn LlmPort>,
        chunk_store: Arc<dyn ChunkStore>,
    ) -> Self {
        self.llm = Some(llm);
        self.chunk_store = Some(chunk_store);
        self
    }

    pub fn config(&self) -> &RepoMapBuildConfig {
        &self.config
    }

    /// Build and persist a snapshot from scratch
    pub async fn build(&self, input: RepoMapBuildInput<'_>) -> Result<RepoMapSnapshot> {
        let mut nodes = self.build_tree(&input);
        if nodes.is_empty() {
            return Err(AtlasError::Pipeline(
                "no nodes generated from chunks".to_string(),
            ));
        }

        if self.config.pagerank_enabled {
            if let Some(graph) = input.graph {
                self.compute_pagerank_full(&mut nodes, graph);
            }
        }

        self.annotate_change_freq(&mut nodes, input.file_stats);
        self.score(&mut nodes);
        self.summarize(&mut nodes).await;
        self.finish(input.repo_id, input.snapshot_id, nodes)
    }

    /// Apply a chunk refresh incrementally against the previous snapshot
    pub async fn update(
        &self,
        input: RepoMapBuildInput<'_>,
        prev_snapshot_id: &str,
        refresh: &ChunkRefreshResult,
    ) -> Result<RepoMapSnapshot> {
        // Too many changes, or no baseline: the full path is cheaper
        let previous = match self.store.get_snapshot(input.repo_id, prev_snapshot_id)? {
            Some(p) if !RepoMapIncrementalUpdater::should_rebuild_full(refresh, &p) => p,
            _ => {
                info!("incremental update escalated to full rebuild");
                return self.build(input).await;
            }
        };

        let mut nodes = self.build_tree(&input);
        let updater = RepoMapIncrementalUpdater::new(&self.config);

        if self.config.pagerank_enabled {
            if let Some(graph) = input.graph {
                updater.update_pagerank(&mut nodes, Some(&previous), refresh, graph);
            }
        }
        updater.propagate_drift(&mut nodes, refresh);

        self.annotate_change_freq(&mut nodes, input.file_stats);
        self.score(&mut nodes);
        self.summarize(&mut nodes).await;
        self.finish(input.repo_id, input.snapshot_id, nodes)
    }

    fn build_tree(&self, input: &RepoMapBuildInput<'_>) -> Vec<RepoMapNode> {
        let mut tree_builder = RepoMapTreeBuilder::new(input.repo_id, input.snapshot_id);
        let mut nodes = tree_builder.build(input.chunks, input.chunk_to_graph);

        EntrypointDetector::detect(&mut nodes);
        TestNodeDetector::detect(&mut nodes);

        let calculator = HeuristicMetricsCalculator::new(&self.config);
        calculator.filter_nodes(nodes)
    }

    fn compute_pagerank_full(&self, nodes: &mut [RepoMapNode], graph: &GraphDocument) {
        let adapter = GraphAdapter {
            include_inherits: self.config.pagerank_include_inherits,
            include_references: self.config.pagerank_include_references,
            ..Default::default()
        };
        let view = adapter.build_view(graph);
        if view.node_count() == 0 {
            warn!("pagerank skipped: empty graph view, importance falls back to heuristics");
            return;
        }

        let engine = PageRankEngine::new(PageRankSettings {
            damping: self.config.pagerank_damping,
            max_iterations: self.config.pagerank_max_iterations,
            ..Default::default()
        });
        let scores = engine.compute(&view);
        PageRankAggregator::aggregate(nodes, &scores);
        PageRankAggregator::compute_degrees(nodes, &adapter.degree_stats(graph));
    }

    fn annotate_change_freq(
        &self,
        nodes: &mut [RepoMapNode],
        file_stats: Option<&HashMap<String, FileStats>>,
    ) {
        let Some(stats) = file_stats else { return };
        for node in nodes.iter_mut() {
            if let Some(path) = &node.path {
                if let Some(file_stats) = stats.get(path) {
                    node.metrics.change_freq = file_stats.change_freq;
                    node.attrs.insert(
                        "contributor_count".to_string(),
                        serde_json::json!(file_stats.contributor_count()),
                    );
                    if let Some(last) = file_stats.last_modified {
                        node.attrs.insert(
                            "last_modified".to_string(),
                            serde_json::json!(last.to_rfc3339()),
                        );
                    }
                }
            }
        }
    }

    fn score(&self, nodes: &mut [RepoMapNode]) {
        let calculator = HeuristicMetricsCalculator::new(&self.config);
        calculator.compute_importance(nodes);
        calculator.boost_entrypoints(nodes);
        if !self.config.include_tests {
            calculator.penalize_tests(nodes);
        }
    }

    async fn summarize(&self, nodes: &mut Vec<RepoMapNode>) {
        if !self.config.summary_enabled {
            return;
        }
        let (Some(llm), Some(chunk_store)) = (self.llm.clone(), self.chunk_store.clone()) else {
            warn!("summary_enabled but no LLM/chunk store wired, skipping");
            return;
        };

        let cache = Arc::new(InMemorySummaryCache::new());
        let cost = Arc::new(CostController::new(SummaryCostConfig::default()));
        let leaf = Arc::new(LlmSummarizer::new(llm.clone(), cache, cost, chunk_store));
        let summarizer = HierarchicalSummarizer::new(
            llm,
            leaf,
            crate::features::repomap::infrastructure::summarizer::DEFAULT_MAX_CONCURRENT,
            self.config.hierarchical_max_children,
        );

        let summaries = if self.config.use_hierarchical_summary {
            summarizer.summarize_tree(nodes).await
        } else {
            summarizer.summarize_flat(nodes, &self.config).await
        };
        HierarchicalSummarizer::apply_summaries(nodes, &summaries);
    }

    fn finish(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        nodes: Vec<RepoMapNode>,
    ) -> Result<RepoMapSnapshot> {
        let root = nodes
            .iter()
            .find(|n| n.is_root())
            .ok_or_else(|| AtlasError::Pipeline("no repo root node found".to_string()))?;

        let mut metadata = HashMap::new();
        metadata.insert("total_nodes".to_string(), serde_json::json!(nodes.len()));
        metadata.insert(
            "total_loc".to_string(),
            serde_json::json!(root.metrics.loc),
        );
        metadata.insert(
            "total_symbols".to_string(),
            serde_json::json!(root.metrics.symbol_count),
        );

        let snapshot = RepoMapSnapshot {
            repo_id: repo_id.to_string(),
            snapshot_id: snapshot_id.to_string(),
            root_node_id: root.id.clone(),
            nodes,
            schema_version: "1.0".to_string(),
            created_at: Some(Utc::now().to_rfc3339()),
            metadata,
        };

        self.store.save_snapshot(&snapshot)?;
        info!(
            repo = repo_id,
            snapshot = snapshot_id,
            nodes = snapshot.nodes.len(),
            "repomap snapshot saved"
        );
        Ok(snapshot)
    }
}
