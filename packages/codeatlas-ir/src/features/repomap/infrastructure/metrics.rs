//! Heuristic importance scoring
//!
//! importance = w1·loc + w2·symbol_count + w3·edge_degree over min-max
//! normalized metrics. Entrypoints are boosted (capped at 1.0), tests are
//! penalized when excluded from the map.

use std::collections::HashSet;

use crate::features::repomap::domain::{RepoMapBuildConfig, RepoMapNode};

pub struct HeuristicMetricsCalculator<'a> {
    config: &'a RepoMapBuildConfig,
}

impl<'a> HeuristicMetricsCalculator<'a> {
    pub fn new(config: &'a RepoMapBuildConfig) -> Self {
        Self { config }
    }

    /// Compute importance scores for all nodes in place
    pub fn compute_importance(&self, nodes: &mut [RepoMapNode]) {
        if nodes.is_empty() {
            return;
        }

        let locs: Vec<f64> = nodes.iter().map(|n| n.metrics.loc as f64).collect();
        let symbols: Vec<f64> = nodes.iter().map(|n| n.metrics.symbol_count as f64).collect();
        let degrees: Vec<f64> = nodes.iter().map(|n| n.metrics.edge_degree as f64).collect();

        let (loc_min, loc_max) = min_max(&locs);
        let (sym_min, sym_max) = min_max(&symbols);
        let (deg_min, deg_max) = min_max(&degrees);

        for (i, node) in nodes.iter_mut().enumerate() {
            let importance = self.config.heuristic_loc_weight * normalize(locs[i], loc_min, loc_max)
                + self.config.heuristic_symbol_weight * normalize(symbols[i], sym_min, sym_max)
                + self.config.heuristic_edge_weight * normalize(degrees[i], deg_min, deg_max);
            node.metrics.importance = importance.clamp(0.0, 1.0);
        }
    }

    /// Boost entrypoint importance, capped at 1.0
    pub fn boost_entrypoints(&self, nodes: &mut [RepoMapNode]) {
        for node in nodes.iter_mut() {
            if node.is_entrypoint {
                node.metrics.importance =
                    (node.metrics.importance * self.config.entrypoint_boost).min(1.0);
            }
        }
    }

    /// Reduce test importance
    pub fn penalize_tests(&self, nodes: &mut [RepoMapNode]) {
        for node in nodes.iter_mut() {
            if node.is_test {
                node.metrics.importance *= self.config.test_penalty;
            }
        }
    }

    /// Drop tests, small files and over-deep nodes; dropping a node drops
    /// its whole subtree so parent links stay valid
    pub fn filter_nodes(&self, nodes: Vec<RepoMapNode>) -> Vec<RepoMapNode> {
        let mut dropped: HashSet<String> = HashSet::new();

        for node in &nodes {
            let drop = (node.is_test && !self.config.include_tests)
                || (node.kind == crate::features::repomap::domain::RepoMapKind::File
                    && node.metrics.loc < self.config.min_loc)
                || node.depth > self.config.max_depth;
            if drop {
                dropped.insert(node.id.clone());
            }
        }

        // Propagate to descendants (nodes are ordered parents-first)
        for node in &nodes {
            if let Some(parent_id) = &node.parent_id {
                if dropped.contains(parent_id) {
                    dropped.insert(node.id.clone());
                }
            }
        }

        nodes
            .into_iter()
            .filter(|n| !dropped.contains(&n.id))
            .map(|mut n| {
                n.children_ids.retain(|c| !dropped.contains(c));
                n
            })
            .collect()
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < f64::EPSILON {
        0.0
    } else {
        (value - min) / (max - min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::repomap::domain::{RepoMapKind, RepoMapMetrics};

    fn node(id: &str, loc: usize, symbols: usize, degree: usize) -> RepoMapNode {
        let mut n = RepoMapNode::new(id, "r", "s", RepoMapKind::File, id);
        n.metrics = RepoMapMetrics {
            loc,
            symbol_count: symbols,
            edge_degree: degree,
            ..Default::default()
        };
        n
    }

    #[test]
    fn test_importance_ordering() {
        let config = RepoMapBuildConfig::default();
        let calc = HeuristicMetricsCalculator::new(&config);

        let mut nodes = vec![node("big", 1000, 50, 30), node("small", 10, 1, 0)];
        calc.compute_importance(&mut nodes);

        assert!(nodes[0].metrics.importance > nodes[1].metrics.importance);
        assert!((nodes[0].metrics.importance - 1.0).abs() < 1e-9);
        assert!(nodes[1].metrics.importance.abs() < 1e-9);
    }

    #[test]
    fn test_uniform_metrics_normalize_to_zero() {
        let config = RepoMapBuildConfig::default();
        let calc = HeuristicMetricsCalculator::new(&config);

        let mut nodes = vec![node("a", 10, 2, 1), node("b", 10, 2, 1)];
        calc.compute_importance(&mut nodes);
        assert_eq!(nodes[0].metrics.importance, 0.0);
    }

    #[test]
    fn test_entrypoint_boost_capped() {
        let config = RepoMapBuildConfig::default();
        let calc = HeuristicMetricsCalculator::new(&config);

        let mut nodes = vec![node("a", 100, 10, 5)];
        nodes[0].metrics.importance = 0.9;
        nodes[0].is_entrypoint = true;
        calc.boost_entrypoints(&mut nodes);
        assert_eq!(nodes[0].metrics.importance, 1.0);
    }

    #[test]
    fn test_test_penalty() {
        let config = RepoMapBuildConfig::default();
        let calc = HeuristicMetricsCalculator::new(&config);

        let mut nodes = vec![node("t", 100, 10, 5)];
        nodes[0].metrics.importance = 0.8;
        nodes[0].is_test = true;
        calc.penalize_tests(&mut nodes);
        assert!((nodes[0].metrics.importance - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_filter_drops_subtree() {
        let config = RepoMapBuildConfig {
            include_tests: false,
            min_loc: 0,
            ..Default::default()
        };
        let calc = HeuristicMetricsCalculator::new(&config);

        let mut parent = node("tests", 100, 0, 0);
        parent.is_test = true;
        parent.children_ids = vec!["child".to_string()];
        let mut child = RepoMapNode::new("child", "r", "s", RepoMapKind::Function, "child");
        child.parent_id = Some("tests".to_string());
        child.depth = 1;

        let kept = calc.filter_nodes(vec![parent, child]);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_filter_min_loc() {
        let config = RepoMapBuildConfig {
            min_loc: 10,
            ..Default::default()
        };
        let calc = HeuristicMetricsCalculator::new(&config);

        let kept = calc.filter_nodes(vec![node("tiny", 3, 0, 0), node("ok", 50, 0, 0)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "ok");
    }
}
