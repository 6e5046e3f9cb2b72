//! PageRank engine
//!
//! Importance scoring over the call/import subgraph:
//!
//! ```text
//! PR(v) = (1-d)/N + d * Σ(PR(u) / outdegree(u))
//!                       u→v
//! ```
//!
//! The graph view keeps Function/Method/Class/Module/File and external
//! nodes, with CALLS and IMPORTS edges (INHERITS and REFERENCES_TYPE are
//! configurable). CFG blocks, variables and semantic entities are excluded.
//!
//! Scores are normalized to sum to 1, so a graph with nodes but no edges
//! yields a uniform 1/N. An empty graph yields an empty result.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::features::graph_builder::domain::GraphDocument;
use crate::shared::models::{GraphEdgeKind, GraphNodeKind};

/// PageRank configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRankSettings {
    /// Damping factor
    pub damping: f64,
    /// Iteration cap
    pub max_iterations: usize,
    /// Convergence tolerance on the max per-node delta
    pub tolerance: f64,
}

impl Default for PageRankSettings {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 20,
            tolerance: 1e-6,
        }
    }
}

/// In/out degree for one graph node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegreeStats {
    pub in_degree: usize,
    pub out_degree: usize,
}

impl DegreeStats {
    pub fn total(&self) -> usize {
        self.in_degree + self.out_degree
    }
}

/// Directed view over the ranking-relevant subgraph
pub struct GraphView {
    graph: DiGraph<String, ()>,
    index_of: HashMap<String, NodeIndex>,
}

impl GraphView {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.index_of.contains_key(node_id)
    }
}

/// Adapts a GraphDocument into the PageRank view
#[derive(Debug, Clone)]
pub struct GraphAdapter {
    pub include_calls: bool,
    pub include_imports: bool,
    pub include_inherits: bool,
    pub include_references: bool,
}

impl Default for GraphAdapter {
    fn default() -> Self {
        Self {
            include_calls: true,
            include_imports: true,
            include_inherits: false,
            include_references: false,
        }
    }
}

impl GraphAdapter {
    pub fn build_view(&self, doc: &GraphDocument) -> GraphView {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::new();

        let mut node_ids: Vec<&String> = doc
            .graph_nodes
            .iter()
            .filter(|(_, n)| self.include_node(n.kind))
            .map(|(id, _)| id)
            .collect();
        node_ids.sort();

        for id in node_ids {
            let idx = graph.add_node(id.clone());
            index_of.insert(id.clone(), idx);
        }

        for edge in &doc.graph_edges {
            if !self.include_edge(edge.kind) {
                continue;
            }
            let (Some(&source), Some(&target)) = (
                index_of.get(&edge.source_id),
                index_of.get(&edge.target_id),
            ) else {
                continue;
            };
            graph.add_edge(source, target, ());
        }

        GraphView { graph, index_of }
    }

    /// Degree stats over the same filtered view
    pub fn degree_stats(&self, doc: &GraphDocument) -> HashMap<String, DegreeStats> {
        let mut stats: HashMap<String, DegreeStats> = HashMap::new();
        for edge in &doc.graph_edges {
            if !self.include_edge(edge.kind) {
                continue;
            }
            stats.entry(edge.source_id.clone()).or_default().out_degree += 1;
            stats.entry(edge.target_id.clone()).or_default().in_degree += 1;
        }
        stats
    }

    fn include_node(&self, kind: GraphNodeKind) -> bool {
        matches!(
            kind,
            GraphNodeKind::File
                | GraphNodeKind::Module
                | GraphNodeKind::Class
                | GraphNodeKind::Function
                | GraphNodeKind::Method
                | GraphNodeKind::ExternalModule
                | GraphNodeKind::ExternalFunction
        )
    }

    fn include_edge(&self, kind: GraphEdgeKind) -> bool {
        match kind {
            GraphEdgeKind::Calls => self.include_calls,
            GraphEdgeKind::Imports => self.include_imports,
            GraphEdgeKind::Inherits => self.include_inherits,
            GraphEdgeKind::ReferencesType => self.include_references,
            _ => false,
        }
    }
}

/// PageRank engine
pub struct PageRankEngine {
    settings: PageRankSettings,
}

impl PageRankEngine {
    pub fn new(settings: PageRankSettings) -> Self {
        Self { settings }
    }

    /// Standard PageRank over the view
    pub fn compute(&self, view: &GraphView) -> HashMap<String, f64> {
        self.compute_inner(view, None, None)
    }

    /// Personalized PageRank
    ///
    /// The teleport distribution is biased toward `bias` nodes (uniform
    /// over them); `initial` seeds the score vector, letting an incremental
    /// update start from the previous snapshot's scores.
    pub fn compute_personalized(
        &self,
        view: &GraphView,
        bias: &HashMap<String, f64>,
        initial: Option<&HashMap<String, f64>>,
    ) -> HashMap<String, f64> {
        self.compute_inner(view, Some(bias), initial)
    }

    fn compute_inner(
        &self,
        view: &GraphView,
        bias: Option<&HashMap<String, f64>>,
        initial: Option<&HashMap<String, f64>>,
    ) -> HashMap<String, f64> {
        let n = view.graph.node_count();
        if n == 0 {
            return HashMap::new();
        }

        let damping = self.settings.damping;
        let uniform = 1.0 / n as f64;

        // Teleport distribution: uniform, or normalized bias weights
        let teleport: Vec<f64> = match bias {
            None => vec![uniform; n],
            Some(bias) => {
                let mut weights: Vec<f64> = view
                    .graph
                    .node_indices()
                    .map(|idx| bias.get(&view.graph[idx]).copied().unwrap_or(0.0))
                    .collect();
                let total: f64 = weights.iter().sum();
                if total > 0.0 {
                    for w in &mut weights {
                        *w /= total;
                    }
                } else {
                    weights = vec![uniform; n];
                }
                weights
            }
        };

        let mut scores: Vec<f64> = match initial {
            None => vec![uniform; n],
            Some(initial) => {
                let raw: Vec<f64> = view
                    .graph
                    .node_indices()
                    .map(|idx| initial.get(&view.graph[idx]).copied().unwrap_or(uniform))
                    .collect();
                let total: f64 = raw.iter().sum();
                if total > 0.0 {
                    raw.iter().map(|s| s / total).collect()
                } else {
                    vec![uniform; n]
                }
            }
        };

        let outdegrees: Vec<usize> = view
            .graph
            .node_indices()
            .map(|idx| view.graph.neighbors(idx).count())
            .collect();

        for iteration in 0..self.settings.max_iterations {
            let mut next = vec![0.0f64; n];
            let mut max_delta: f64 = 0.0;

            for idx in view.graph.node_indices() {
                let i = idx.index();
                let incoming_sum: f64 = view
                    .graph
                    .neighbors_directed(idx, petgraph::Direction::Incoming)
                    .map(|src| {
                        let s = src.index();
                        scores[s] / outdegrees[s].max(1) as f64
                    })
                    .sum();

                let score = (1.0 - damping) * teleport[i] + damping * incoming_sum;
                max_delta = max_delta.max((score - scores[i]).abs());
                next[i] = score;
            }

            scores = next;

            if max_delta < self.settings.tolerance {
                debug!(iterations = iteration + 1, "pagerank converged");
                break;
            }
        }

        // Normalize to sum 1 so edgeless graphs come out uniform
        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            for s in &mut scores {
                *s /= total;
            }
        }

        view.graph
            .node_indices()
            .map(|idx| (view.graph[idx].clone(), scores[idx.index()]))
            .collect()
    }
}

impl Default for PageRankEngine {
    fn default() -> Self {
        Self::new(PageRankSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;
    use crate::features::graph_builder::domain::{GraphEdge, GraphNode};

    fn doc_with(nodes: &[(&str, GraphNodeKind)], edges: &[(&str, &str, GraphEdgeKind)]) -> GraphDocument {
        let mut doc = GraphDocument::new("r", "s");
        for (id, kind) in nodes {
            doc.graph_nodes.insert(
                id.to_string(),
                GraphNode {
                    id: id.to_string(),
                    kind: *kind,
                    repo_id: "r".to_string(),
                    snapshot_id: Some("s".to_string()),
                    fqn: id.to_string(),
                    name: id.to_string(),
                    path: None,
                    span: None,
                    attrs: AHashMap::new(),
                },
            );
        }
        for (i, (src, dst, kind)) in edges.iter().enumerate() {
            doc.graph_edges.push(GraphEdge::new(
                format!("e{}", i),
                *kind,
                src.to_string(),
                dst.to_string(),
            ));
        }
        doc
    }

    #[test]
    fn test_empty_graph() {
        let doc = GraphDocument::new("r", "s");
        let view = GraphAdapter::default().build_view(&doc);
        let scores = PageRankEngine::default().compute(&view);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_edgeless_graph_is_uniform() {
        let doc = doc_with(
            &[
                ("a", GraphNodeKind::Function),
                ("b", GraphNodeKind::Function),
                ("c", GraphNodeKind::Function),
                ("d", GraphNodeKind::Function),
            ],
            &[],
        );
        let view = GraphAdapter::default().build_view(&doc);
        let scores = PageRankEngine::default().compute(&view);

        assert_eq!(scores.len(), 4);
        for score in scores.values() {
            assert!((score - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_call_chain_ranking() {
        // main→helper1, main→helper2, helper1→helper2
        // Expected: helper2 > helper1 >= main
        let doc = doc_with(
            &[
                ("main", GraphNodeKind::Function),
                ("helper1", GraphNodeKind::Function),
                ("helper2", GraphNodeKind::Function),
            ],
            &[
                ("main", "helper1", GraphEdgeKind::Calls),
                ("main", "helper2", GraphEdgeKind::Calls),
                ("helper1", "helper2", GraphEdgeKind::Calls),
            ],
        );
        let view = GraphAdapter::default().build_view(&doc);
        let scores = PageRankEngine::default().compute(&view);

        let main = scores["main"];
        let h1 = scores["helper1"];
        let h2 = scores["helper2"];
        assert!(h2 > h1, "helper2 ({h2}) should outrank helper1 ({h1})");
        assert!(h1 >= main, "helper1 ({h1}) should be >= main ({main})");
    }

    #[test]
    fn test_cfg_and_variable_nodes_excluded() {
        let doc = doc_with(
            &[
                ("f", GraphNodeKind::Function),
                ("v", GraphNodeKind::Variable),
                ("b", GraphNodeKind::CfgBlock),
            ],
            &[("b", "v", GraphEdgeKind::Reads)],
        );
        let view = GraphAdapter::default().build_view(&doc);
        assert_eq!(view.node_count(), 1);
        assert_eq!(view.edge_count(), 0);
    }

    #[test]
    fn test_personalized_bias() {
        let doc = doc_with(
            &[
                ("a", GraphNodeKind::Function),
                ("b", GraphNodeKind::Function),
                ("c", GraphNodeKind::Function),
            ],
            &[("a", "b", GraphEdgeKind::Calls)],
        );
        let view = GraphAdapter::default().build_view(&doc);
        let engine = PageRankEngine::default();

        let mut bias = HashMap::new();
        bias.insert("c".to_string(), 1.0);
        let scores = engine.compute_personalized(&view, &bias, None);

        // All teleportation mass flows to c
        assert!(scores["c"] > scores["a"]);
    }

    #[test]
    fn test_degree_stats() {
        let doc = doc_with(
            &[
                ("a", GraphNodeKind::Function),
                ("b", GraphNodeKind::Function),
            ],
            &[
                ("a", "b", GraphEdgeKind::Calls),
                ("a", "b", GraphEdgeKind::Inherits), // excluded by default
            ],
        );
        let stats = GraphAdapter::default().degree_stats(&doc);
        assert_eq!(stats["a"].out_degree, 1);
        assert_eq!(stats["b"].in_degree, 1);
        assert_eq!(stats["b"].total(), 1);
    }
}
