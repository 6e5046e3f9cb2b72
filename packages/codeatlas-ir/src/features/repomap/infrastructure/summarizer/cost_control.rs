//! Summarization cost control
//!
//! Enforces a total token budget per snapshot and a minimum importance
//! threshold. Per-node cost is
//! `min(loc · tokens_per_loc, input_cap) + output_estimate`. Cache hits
//! bypass the budget entirely.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::features::repomap::domain::RepoMapNode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryCostConfig {
    /// Total token budget for all summaries in one snapshot
    pub max_tokens_per_snapshot: usize,
    /// Cap on a single summary's output
    pub max_tokens_per_summary: u32,
    /// Nodes below this importance are skipped
    pub min_importance_threshold: f64,
    /// Estimated input tokens per line of code
    pub tokens_per_loc: usize,
    /// Input estimate cap per node
    pub input_cap: usize,
    /// Output estimate per node
    pub output_estimate: usize,
}

impl Default for SummaryCostConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_snapshot: 100_000,
            max_tokens_per_summary: 200,
            min_importance_threshold: 0.3,
            tokens_per_loc: 4,
            input_cap: 2000,
            output_estimate: 150,
        }
    }
}

pub struct CostController {
    config: SummaryCostConfig,
    used_tokens: Mutex<usize>,
}

impl CostController {
    pub fn new(config: SummaryCostConfig) -> Self {
        Self {
            config,
            used_tokens: Mutex::new(0),
        }
    }

    pub fn config(&self) -> &SummaryCostConfig {
        &self.config
    }

    /// Estimated total tokens (input + output) for one node
    pub fn estimate_node_cost(&self, node: &RepoMapNode) -> usize {
        let input = (node.metrics.loc * self.config.tokens_per_loc).min(self.config.input_cap);
        input + self.config.output_estimate
    }

    pub fn meets_importance_threshold(&self, node: &RepoMapNode) -> bool {
        node.metrics.importance >= self.config.min_importance_threshold
    }

    /// Reserve budget for a node; false when the snapshot budget is spent
    pub fn try_reserve(&self, node: &RepoMapNode) -> bool {
        let cost = self.estimate_node_cost(node);
        let mut used = self.used_tokens.lock();
        if *used + cost > self.config.max_tokens_per_snapshot {
            return false;
        }
        *used += cost;
        true
    }

    pub fn used_tokens(&self) -> usize {
        *self.used_tokens.lock()
    }

    pub fn remaining_budget(&self) -> usize {
        self.config
            .max_tokens_per_snapshot
            .saturating_sub(self.used_tokens())
    }
}

impl Default for CostController {
    fn default() -> Self {
        Self::new(SummaryCostConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::repomap::domain::{RepoMapKind, RepoMapMetrics};

    fn node_with_loc(loc: usize) -> RepoMapNode {
        let mut n = RepoMapNode::new("n", "r", "s", RepoMapKind::Function, "n");
        n.metrics = RepoMapMetrics {
            loc,
            importance: 0.9,
            ..Default::default()
        };
        n
    }

    #[test]
    fn test_cost_estimate_is_capped() {
        let controller = CostController::default();
        // 50 loc * 4 = 200 input + 150 output
        assert_eq!(controller.estimate_node_cost(&node_with_loc(50)), 350);
        // Huge node caps at 2000 input
        assert_eq!(controller.estimate_node_cost(&node_with_loc(100_000)), 2150);
    }

    #[test]
    fn test_budget_exhaustion() {
        let config = SummaryCostConfig {
            max_tokens_per_snapshot: 500,
            ..Default::default()
        };
        let controller = CostController::new(config);
        let node = node_with_loc(50); // 350 tokens

        assert!(controller.try_reserve(&node));
        assert_eq!(controller.used_tokens(), 350);
        // Second reservation would exceed 500
        assert!(!controller.try_reserve(&node));
        assert_eq!(controller.remaining_budget(), 150);
    }

    #[test]
    fn test_importance_threshold() {
        let controller = CostController::default();
        let mut node = node_with_loc(10);
        node.metrics.importance = 0.1;
        assert!(!controller.meets_importance_threshold(&node));
        node.metrics.importance = 0.5;
        assert!(controller.meets_importance_threshold(&node));
    }
}
