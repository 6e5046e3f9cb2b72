//! PageRank aggregation onto RepoMap nodes
//!
//! A RepoMapNode carries graph node ids; their scores fold into one number
//! per node:
//! - function/method/symbol → MEAN
//! - class → MAX (the most important method defines class importance)
//! - file/module/dir/project/repo → SUM (cumulative)
//!
//! `edge_degree` is the sum of in+out degree across the mapped graph nodes.

use std::collections::HashMap;

use super::pagerank::DegreeStats;
use crate::features::repomap::domain::{RepoMapKind, RepoMapNode};

/// PageRank aggregation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationStrategy {
    Max,
    Mean,
    Sum,
}

impl AggregationStrategy {
    fn for_kind(kind: RepoMapKind) -> Self {
        match kind {
            RepoMapKind::Function | RepoMapKind::Symbol => AggregationStrategy::Mean,
            RepoMapKind::Class => AggregationStrategy::Max,
            RepoMapKind::File
            | RepoMapKind::Module
            | RepoMapKind::Dir
            | RepoMapKind::Project
            | RepoMapKind::Repo => AggregationStrategy::Sum,
        }
    }

    fn apply(&self, scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        match self {
            AggregationStrategy::Max => scores.iter().cloned().fold(f64::MIN, f64::max),
            AggregationStrategy::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
            AggregationStrategy::Sum => scores.iter().sum(),
        }
    }
}

/// Bidirectional mapping between RepoMapNode ids and graph node ids, used
/// by the incremental path to express affected sets and previous scores at
/// graph-node granularity
#[derive(Debug, Default)]
pub struct NodeGraphBimap {
    pub node_to_graph: HashMap<String, Vec<String>>,
    pub graph_to_node: HashMap<String, Vec<String>>,
}

impl NodeGraphBimap {
    pub fn build(nodes: &[RepoMapNode]) -> Self {
        let mut bimap = Self::default();
        for node in nodes {
            if node.graph_node_ids.is_empty() {
                continue;
            }
            bimap
                .node_to_graph
                .insert(node.id.clone(), node.graph_node_ids.clone());
            for gid in &node.graph_node_ids {
                bimap
                    .graph_to_node
                    .entry(gid.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        }
        bimap
    }

    /// Project previous per-node scores down to graph-node granularity
    pub fn node_scores_to_graph(&self, node_scores: &HashMap<String, f64>) -> HashMap<String, f64> {
        let mut out = HashMap::new();
        for (node_id, score) in node_scores {
            if let Some(graph_ids) = self.node_to_graph.get(node_id) {
                for gid in graph_ids {
                    out.insert(gid.clone(), *score);
                }
            }
        }
        out
    }

    /// Graph-node ids belonging to a set of RepoMap nodes
    pub fn graph_ids_for_nodes<'a>(
        &self,
        node_ids: impl IntoIterator<Item = &'a String>,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for node_id in node_ids {
            if let Some(graph_ids) = self.node_to_graph.get(node_id) {
                out.extend(graph_ids.iter().cloned());
            }
        }
        out.sort();
        out.dedup();
        out
    }
}

pub struct PageRankAggregator;

impl PageRankAggregator {
    /// Fold graph-node PageRank scores onto RepoMap nodes in place
    pub fn aggregate(nodes: &mut [RepoMapNode], pagerank_scores: &HashMap<String, f64>) {
        for node in nodes.iter_mut() {
            let scores: Vec<f64> = node
                .graph_node_ids
                .iter()
                .filter_map(|gid| pagerank_scores.get(gid).copied())
                .collect();

            node.metrics.pagerank = AggregationStrategy::for_kind(node.kind).apply(&scores);
        }
    }

    /// Sum mapped in/out degrees into `edge_degree`
    pub fn compute_degrees(nodes: &mut [RepoMapNode], degree_stats: &HashMap<String, DegreeStats>) {
        for node in nodes.iter_mut() {
            node.metrics.edge_degree = node
                .graph_node_ids
                .iter()
                .filter_map(|gid| degree_stats.get(gid))
                .map(|d| d.total())
                .sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: RepoMapKind, graph_ids: &[&str]) -> RepoMapNode {
        let mut n = RepoMapNode::new(id, "r", "s", kind, id);
        n.graph_node_ids = graph_ids.iter().map(|s| s.to_string()).collect();
        n
    }

    fn scores(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_strategy_by_kind() {
        let pagerank = scores(&[("g1", 0.1), ("g2", 0.3)]);

        let mut nodes = vec![
            node("fn", RepoMapKind::Function, &["g1", "g2"]),
            node("cls", RepoMapKind::Class, &["g1", "g2"]),
            node("file", RepoMapKind::File, &["g1", "g2"]),
        ];
        PageRankAggregator::aggregate(&mut nodes, &pagerank);

        assert!((nodes[0].metrics.pagerank - 0.2).abs() < 1e-9); // mean
        assert!((nodes[1].metrics.pagerank - 0.3).abs() < 1e-9); // max
        assert!((nodes[2].metrics.pagerank - 0.4).abs() < 1e-9); // sum
    }

    #[test]
    fn test_unmapped_node_scores_zero() {
        let pagerank = scores(&[("g1", 0.5)]);
        let mut nodes = vec![node("fn", RepoMapKind::Function, &[])];
        PageRankAggregator::aggregate(&mut nodes, &pagerank);
        assert_eq!(nodes[0].metrics.pagerank, 0.0);
    }

    #[test]
    fn test_edge_degree() {
        let mut stats = HashMap::new();
        stats.insert(
            "g1".to_string(),
            DegreeStats {
                in_degree: 2,
                out_degree: 1,
            },
        );
        stats.insert(
            "g2".to_string(),
            DegreeStats {
                in_degree: 0,
                out_degree: 4,
            },
        );

        let mut nodes = vec![node("f", RepoMapKind::File, &["g1", "g2"])];
        PageRankAggregator::compute_degrees(&mut nodes, &stats);
        assert_eq!(nodes[0].metrics.edge_degree, 7);
    }

    #[test]
    fn test_bimap_roundtrip() {
        let nodes = vec![
            node("n1", RepoMapKind::Function, &["g1"]),
            node("n2", RepoMapKind::File, &["g1", "g2"]),
        ];
        let bimap = NodeGraphBimap::build(&nodes);

        assert_eq!(bimap.graph_to_node["g1"].len(), 2);
        let graph_ids = bimap.graph_ids_for_nodes(["n2".to_string()].iter());
        assert_eq!(graph_ids, vec!["g1".to_string(), "g2".to_string()]);

        let node_scores = [("n1".to_string(), 0.7)].into_iter().collect();
        let projected = bimap.node_scores_to_graph(&node_scores);
        assert_eq!(projected["g1"], 0.7);
    }
}
