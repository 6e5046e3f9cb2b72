//! RepoMap incremental updater
//!
//! Applies a chunk refresh result to produce a new snapshot cheaply. The
//! tree itself is rebuilt (linear and cheap); the expensive signals are
//! carried over or partially recomputed:
//!
//! PageRank policy by affected-node ratio:
//! - < 10%: skip; prior scores are retained by node identity, new nodes
//!   score 0.0 (accepted minor error)
//! - 10–50%: personalized PageRank biased toward the affected nodes, with
//!   the previous scores as the initial vector
//! - > 50%: full recompute
//!
//! Drift scores propagate from the refresher's drifted list onto the
//! matching nodes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use super::aggregator::{NodeGraphBimap, PageRankAggregator};
use super::pagerank::{GraphAdapter, PageRankEngine, PageRankSettings};
use crate::features::chunking::domain::{Chunk, ChunkRefreshResult};
use crate::features::graph_builder::domain::GraphDocument;
use crate::features::repomap::domain::{RepoMapBuildConfig, RepoMapNode, RepoMapSnapshot};

/// Ratio below which PageRank is skipped entirely
const SKIP_THRESHOLD: f64 = 0.10;
/// Ratio above which a full recompute is cheaper than personalization
const FULL_RECOMPUTE_THRESHOLD: f64 = 0.50;

/// Strategy chosen for one incremental update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRankUpdateMode {
    Skip,
    Personalized,
    Full,
}

pub struct RepoMapIncrementalUpdater<'a> {
    config: &'a RepoMapBuildConfig,
}

impl<'a> RepoMapIncrementalUpdater<'a> {
    pub fn new(config: &'a RepoMapBuildConfig) -> Self {
        Self { config }
    }

    /// Pick the update mode from the affected ratio
    pub fn select_mode(affected: usize, total: usize) -> PageRankUpdateMode {
        if total == 0 {
            return PageRankUpdateMode::Full;
        }
        let ratio = affected as f64 / total as f64;
        if ratio < SKIP_THRESHOLD {
            PageRankUpdateMode::Skip
        } else if ratio <= FULL_RECOMPUTE_THRESHOLD {
            PageRankUpdateMode::Personalized
        } else {
            PageRankUpdateMode::Full
        }
    }

    /// Nodes touched by the refresh: anything whose path or chunk ids
    /// intersect the changed chunks
    pub fn affected_node_ids(
        refresh: &ChunkRefreshResult,
        nodes: &[RepoMapNode],
    ) -> HashSet<String> {
        let affected_files = refresh.affected_files();
        let changed_chunk_ids: HashSet<&str> = refresh
            .added
            .iter()
            .chain(refresh.updated.iter())
            .chain(refresh.deleted.iter())
            .map(|c: &Chunk| c.chunk_id.as_str())
            .collect();

        nodes
            .iter()
            .filter(|node| {
                node.path
                    .as_ref()
                    .map(|p| affected_files.contains(p))
                    .unwrap_or(false)
                    || node
                        .chunk_ids
                        .iter()
                        .any(|id| changed_chunk_ids.contains(id.as_str()))
            })
            .map(|n| n.id.clone())
            .collect()
    }

    /// Apply the PageRank policy to a freshly rebuilt node set
    ///
    /// `previous` supplies prior scores; node identity across snapshots is
    /// the `{kind}:{identifier}` tail of the node id, which is stable when
    /// only the snapshot id changes.
    pub fn update_pagerank(
        &self,
        nodes: &mut [RepoMapNode],
        previous: Option<&RepoMapSnapshot>,
        refresh: &ChunkRefreshResult,
        graph: &GraphDocument,
    ) -> PageRankUpdateMode {
        let adapter = GraphAdapter {
            include_inherits: self.config.pagerank_include_inherits,
            include_references: self.config.pagerank_include_references,
            ..Default::default()
        };
        let view = adapter.build_view(graph);

        let affected = Self::affected_node_ids(refresh, nodes);
        let mode = match previous {
            None => PageRankUpdateMode::Full,
            Some(_) => Self::select_mode(affected.len(), nodes.len().max(1)),
        };
        info!(?mode, affected = affected.len(), total = nodes.len(), "pagerank update");

        let engine = PageRankEngine::new(PageRankSettings {
            damping: self.config.pagerank_damping,
            max_iterations: self.config.pagerank_max_iterations,
            ..Default::default()
        });

        match mode {
            PageRankUpdateMode::Skip => {
                // Retain prior scores; new nodes stay at 0.0
                let prior = previous
                    .map(|snapshot| scores_by_identity(&snapshot.nodes))
                    .unwrap_or_default();
                for node in nodes.iter_mut() {
                    if let Some(score) = prior.get(&identity_key(&node.id)) {
                        node.metrics.pagerank = *score;
                    }
                }
            }
            PageRankUpdateMode::Personalized => {
                // Both the affected set and the previous scores are
                // expressed at graph-node granularity via the bimap.
                let bimap = NodeGraphBimap::build(nodes);
                let bias: HashMap<String, f64> = bimap
                    .graph_ids_for_nodes(affected.iter())
                    .into_iter()
                    .map(|gid| (gid, 1.0))
                    .collect();

                let initial = previous.map(|snapshot| {
                    let prior = scores_by_identity(&snapshot.nodes);
                    let node_scores: HashMap<String, f64> = nodes
                        .iter()
                        .filter_map(|n| {
                            prior
                                .get(&identity_key(&n.id))
                                .map(|s| (n.id.clone(), *s))
                        })
                        .collect();
                    bimap.node_scores_to_graph(&node_scores)
                });

                let scores = engine.compute_personalized(&view, &bias, initial.as_ref());
                PageRankAggregator::aggregate(nodes, &scores);
            }
            PageRankUpdateMode::Full => {
                let scores = engine.compute(&view);
                PageRankAggregator::aggregate(nodes, &scores);
            }
        }

        PageRankAggregator::compute_degrees(nodes, &adapter.degree_stats(graph));
        mode
    }

    /// Propagate span drift from the refresh onto node metrics
    ///
    /// `drift_score = min(1.0, drift / (2 × span_drift_threshold))`
    pub fn propagate_drift(&self, nodes: &mut [RepoMapNode], refresh: &ChunkRefreshResult) {
        if refresh.drifted.is_empty() {
            return;
        }

        let drift_by_chunk: HashMap<&str, u32> = refresh
            .drifted
            .iter()
            .map(|c| (c.chunk_id.as_str(), c.span_drift()))
            .collect();

        let denominator = (2 * self.config.span_drift_threshold).max(1) as f64;
        for node in nodes.iter_mut() {
            let drift = node
                .chunk_ids
                .iter()
                .filter_map(|id| drift_by_chunk.get(id.as_str()))
                .max();
            if let Some(&drift) = drift {
                node.metrics.drift_score = (drift as f64 / denominator).min(1.0);
                debug!(node = %node.id, drift, "drift score propagated");
            }
        }
    }

    /// Whether the change set is too large for an incremental path
    pub fn should_rebuild_full(refresh: &ChunkRefreshResult, previous: &RepoMapSnapshot) -> bool {
        let total = previous.nodes.len();
        total == 0
            || (refresh.total_changes() as f64 / total as f64) > FULL_RECOMPUTE_THRESHOLD
    }

    pub fn config(&self) -> &RepoMapBuildConfig {
        self.config
    }
}

/// `{kind}:{identifier}` tail of a repomap node id, stable across snapshots
fn identity_key(node_id: &str) -> String {
    node_id
        .splitn(4, ':')
        .nth(3)
        .map(|tail| tail.to_string())
        .unwrap_or_else(|| node_id.to_string())
}

fn scores_by_identity(nodes: &[RepoMapNode]) -> HashMap<String, f64> {
    nodes
        .iter()
        .map(|n| (identity_key(&n.id), n.metrics.pagerank))
        .collect()
}
