//! Hierarchical summarizer
//!
//! Bottom-up by depth: leaves (functions/classes, or any node without
//! children) are summarized directly; parents aggregate the overview lines
//! of their most important children through a short aggregation prompt.
//! Each level's results land in the result map before the next level runs,
//! so depths are strictly sequential while nodes within one depth fan out
//! under a semaphore.
//!
//! The flat legacy mode selects the top K% by importance plus entrypoints
//! and summarizes each independently.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::llm_summarizer::{fallback_summary, parse_two_level, LlmSummarizer};
use crate::features::repomap::domain::{RepoMapBuildConfig, RepoMapKind, RepoMapNode, TwoLevelSummary};
use crate::shared::ports::LlmPort;

/// Default bound on simultaneous LLM calls within one depth
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

enum SummarizeTask {
    Leaf(RepoMapNode),
    /// Parent with pre-collected `(child_name, child_overview)` pairs
    Parent(RepoMapNode, Vec<(String, String)>),
}

fn aggregation_prompt(node: &RepoMapNode, children: &[(String, String)]) -> String {
    let listing: String = children
        .iter()
        .map(|(name, overview)| format!("- {}: {}", name, overview))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "These are the main components of the {kind} '{name}':\n\
         \n\
         {listing}\n\
         \n\
         Summarize the overall purpose and role of this {kind}.\n\
         \n\
         Output format:\n\
         Overview: [one concise line]\n\
         Details: [2-3 sentences on purpose, main features and responsibilities]",
        kind = node.kind,
        name = node.name,
        listing = listing,
    )
}

pub struct HierarchicalSummarizer {
    llm: Arc<dyn LlmPort>,
    leaf_summarizer: Arc<LlmSummarizer>,
    max_concurrent: usize,
    max_children: usize,
}

impl HierarchicalSummarizer {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        leaf_summarizer: Arc<LlmSummarizer>,
        max_concurrent: usize,
        max_children: usize,
    ) -> Self {
        Self {
            llm,
            leaf_summarizer,
            max_concurrent,
            max_children,
        }
    }

    /// Summarize the whole tree bottom-up
    ///
    /// Returns node_id → summary for every node.
    pub async fn summarize_tree(&self, nodes: &[RepoMapNode]) -> HashMap<String, TwoLevelSummary> {
        let node_map: HashMap<String, RepoMapNode> =
            nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();

        // BTreeMap gives ascending depths; iterate in reverse for bottom-up
        let mut by_depth: BTreeMap<usize, Vec<&RepoMapNode>> = BTreeMap::new();
        for node in nodes {
            by_depth.entry(node.depth).or_default().push(node);
        }

        let mut summaries: HashMap<String, TwoLevelSummary> = HashMap::new();

        for (depth, depth_nodes) in by_depth.iter().rev() {
            info!(depth, nodes = depth_nodes.len(), "summarizing depth");

            let tasks: Vec<SummarizeTask> = depth_nodes
                .iter()
                .map(|node| self.plan_task(node, &node_map, &summaries))
                .collect();

            let results = self.run_depth(tasks).await;
            summaries.extend(results);
        }

        summaries
    }

    /// Flat legacy mode: top K% by importance plus entrypoints
    pub async fn summarize_flat(
        &self,
        nodes: &[RepoMapNode],
        config: &RepoMapBuildConfig,
    ) -> HashMap<String, TwoLevelSummary> {
        let mut sorted: Vec<&RepoMapNode> = nodes.iter().collect();
        sorted.sort_by(|a, b| {
            b.metrics
                .importance
                .partial_cmp(&a.metrics.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let top_n = ((nodes.len() as f64) * config.summary_top_percent) as usize;
        let mut selected: Vec<&RepoMapNode> = sorted.into_iter().take(top_n).collect();
        if config.summary_always_entrypoints {
            for node in nodes.iter().filter(|n| n.is_entrypoint) {
                if !selected.iter().any(|s| s.id == node.id) {
                    selected.push(node);
                }
            }
        }

        let tasks: Vec<SummarizeTask> = selected
            .into_iter()
            .map(|n| SummarizeTask::Leaf(n.clone()))
            .collect();
        self.run_depth(tasks).await
    }

    /// Decide leaf vs. parent and pre-collect child overviews
    fn plan_task(
        &self,
        node: &RepoMapNode,
        node_map: &HashMap<String, RepoMapNode>,
        summaries: &HashMap<String, TwoLevelSummary>,
    ) -> SummarizeTask {
        let is_symbol = matches!(
            node.kind,
            RepoMapKind::Function | RepoMapKind::Class | RepoMapKind::Symbol
        );
        if node.is_leaf() || is_symbol {
            return SummarizeTask::Leaf(node.clone());
        }

        // Children with summaries, most important first, capped
        let mut children: Vec<(&RepoMapNode, &TwoLevelSummary)> = node
            .children_ids
            .iter()
            .filter_map(|id| {
                let child = node_map.get(id)?;
                let summary = summaries.get(id)?;
                Some((child, summary))
            })
            .collect();
        children.sort_by(|a, b| {
            b.0.metrics
                .importance
                .partial_cmp(&a.0.metrics.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        children.truncate(self.max_children);

        let overviews: Vec<(String, String)> = children
            .into_iter()
            .map(|(child, summary)| (child.name.clone(), summary.overview.clone()))
            .collect();

        SummarizeTask::Parent(node.clone(), overviews)
    }

    /// Run one depth's tasks with bounded concurrency
    async fn run_depth(&self, tasks: Vec<SummarizeTask>) -> HashMap<String, TwoLevelSummary> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();

        for task in tasks {
            let semaphore = semaphore.clone();
            let llm = self.llm.clone();
            let leaf_summarizer = self.leaf_summarizer.clone();

            join_set.spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                match task {
                    SummarizeTask::Leaf(node) => {
                        let summary = leaf_summarizer.summarize_leaf(&node).await;
                        (node.id, summary)
                    }
                    SummarizeTask::Parent(node, overviews) => {
                        let summary = summarize_parent(&llm, &node, &overviews).await;
                        (node.id, summary)
                    }
                }
            });
        }

        let mut out = HashMap::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((node_id, summary)) => {
                    out.insert(node_id, summary);
                }
                Err(e) => warn!(error = %e, "summarization task panicked"),
            }
        }
        out
    }

    /// Write summaries back onto the nodes
    pub fn apply_summaries(
        nodes: &mut [RepoMapNode],
        summaries: &HashMap<String, TwoLevelSummary>,
    ) {
        for node in nodes.iter_mut() {
            if let Some(summary) = summaries.get(&node.id) {
                node.summary = Some(summary.clone());
            }
        }
    }
}

async fn summarize_parent(
    llm: &Arc<dyn LlmPort>,
    node: &RepoMapNode,
    overviews: &[(String, String)],
) -> TwoLevelSummary {
    if overviews.is_empty() {
        warn!(node = %node.id, "no child summaries, using fallback");
        return fallback_summary(node);
    }

    let prompt = aggregation_prompt(node, overviews);
    match llm.generate(&prompt, 200, 0.3).await {
        Ok(response) => {
            let (overview, detailed) = parse_two_level(&response);
            TwoLevelSummary {
                overview,
                detailed,
                aggregated_from: overviews.len(),
            }
        }
        Err(e) => {
            warn!(node = %node.id, error = %e, "parent summarization failed, using fallback");
            let mut fb = fallback_summary(node);
            fb.aggregated_from = overviews.len();
            fb
        }
    }
}
