//! Leaf-node LLM summarizer
//!
//! Generates the 2-level summary for a single node from its chunk. Every
//! failure path lands on the deterministic fallback
//! (`"{kind}: {name}"` / `"Contains N components"`); one node's failure
//! never aborts a batch.

use std::sync::Arc;

use tracing::warn;

use super::cache::SummaryCache;
use super::cost_control::CostController;
use crate::features::chunking::domain::Chunk;
use crate::features::chunking::ports::ChunkStore;
use crate::features::repomap::domain::{RepoMapNode, TwoLevelSummary};
use crate::shared::ports::LlmPort;

const OVERVIEW_MAX_LEN: usize = 150;
const DETAILED_MAX_LEN: usize = 500;

/// Prompt templates per node kind; concise to minimize tokens
fn leaf_prompt(node: &RepoMapNode, chunk: &Chunk) -> String {
    let language = chunk.language.as_deref().unwrap_or("text");
    let location = match (&chunk.file_path, chunk.start_line, chunk.end_line) {
        (Some(path), Some(start), Some(end)) => format!("{}:{}-{}", path, start, end),
        (Some(path), _, _) => path.clone(),
        _ => chunk.fqn.clone(),
    };

    format!(
        "Summarize this {kind} in two parts.\n\
         \n\
         {kind}: {fqn}\n\
         Language: {language}\n\
         Source: {location}\n\
         \n\
         Output format:\n\
         Overview: [one concise line]\n\
         Details: [2-3 sentences on purpose, behavior and responsibilities]",
        kind = node.kind,
        fqn = node.fqn.as_deref().unwrap_or(&node.name),
        language = language,
        location = location,
    )
}

/// Deterministic fallback used on any failure or skip
pub fn fallback_summary(node: &RepoMapNode) -> TwoLevelSummary {
    TwoLevelSummary {
        overview: format!("{}: {}", node.kind, node.name),
        detailed: format!("Contains {} components", node.children_ids.len()),
        aggregated_from: 0,
    }
}

/// Parse the two-part completion; unlabeled responses degrade gracefully
pub fn parse_two_level(response: &str) -> (String, String) {
    let mut overview = String::new();
    let mut detailed = String::new();

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Overview:") {
            overview = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Details:") {
            detailed = rest.trim().to_string();
        } else if !detailed.is_empty() && !line.is_empty() {
            detailed.push(' ');
            detailed.push_str(line);
        }
    }

    if overview.is_empty() {
        overview = response.lines().next().unwrap_or("").trim().to_string();
    }
    if detailed.is_empty() {
        detailed = overview.clone();
    }

    truncate_at_boundary(&mut overview, OVERVIEW_MAX_LEN);
    truncate_at_boundary(&mut detailed, DETAILED_MAX_LEN);
    (overview, detailed)
}

fn truncate_at_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

pub struct LlmSummarizer {
    llm: Arc<dyn LlmPort>,
    cache: Arc<dyn SummaryCache>,
    cost: Arc<CostController>,
    chunk_store: Arc<dyn ChunkStore>,
}

impl LlmSummarizer {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        cache: Arc<dyn SummaryCache>,
        cost: Arc<CostController>,
        chunk_store: Arc<dyn ChunkStore>,
    ) -> Self {
        Self {
            llm,
            cache,
            cost,
            chunk_store,
        }
    }

    /// Summarize one leaf node
    ///
    /// Order of checks: cache (bypasses budget) → importance threshold →
    /// budget reservation → LLM call. Failures fall back deterministically.
    pub async fn summarize_leaf(&self, node: &RepoMapNode) -> TwoLevelSummary {
        let chunk = match self.load_chunk(node).await {
            Some(chunk) => chunk,
            None => return fallback_summary(node),
        };

        // Cache hit by content hash reuses the prior summary exactly
        if let Some(hash) = &chunk.content_hash {
            if let Some(cached) = self.cache.get(hash) {
                return cached;
            }
        }

        if !self.cost.meets_importance_threshold(node) || !self.cost.try_reserve(node) {
            return fallback_summary(node);
        }

        let prompt = leaf_prompt(node, &chunk);
        match self
            .llm
            .generate(&prompt, self.cost.config().max_tokens_per_summary, 0.3)
            .await
        {
            Ok(response) => {
                let (overview, detailed) = parse_two_level(&response);
                let summary = TwoLevelSummary {
                    overview,
                    detailed,
                    aggregated_from: 0,
                };
                if let Some(hash) = &chunk.content_hash {
                    self.cache.set(hash, summary.clone());
                }
                summary
            }
            Err(e) => {
                warn!(node = %node.id, error = %e, "leaf summarization failed, using fallback");
                fallback_summary(node)
            }
        }
    }

    async fn load_chunk(&self, node: &RepoMapNode) -> Option<Chunk> {
        let chunk_id = node.chunk_ids.first()?;
        match self.chunk_store.get_chunk(chunk_id).await {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(node = %node.id, error = %e, "chunk lookup failed");
                None
            }
        }
    }
}
