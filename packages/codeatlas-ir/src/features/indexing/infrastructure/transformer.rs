//! Index transformer
//!
//! Converts each chunk plus its graph mapping and RepoMap enrichment into a
//! flat IndexDocument.

use std::collections::HashMap;

use crate::features::chunking::domain::{Chunk, ChunkToGraph};
use crate::features::graph_builder::domain::GraphDocument;
use crate::features::indexing::domain::IndexDocument;
use crate::features::repomap::domain::RepoMapSnapshot;

pub struct IndexTransformer;

impl IndexTransformer {
    /// Transform one snapshot's chunks into index documents
    ///
    /// `repomap` supplies importance/pagerank and summaries; chunks without
    /// a matching node keep those fields empty.
    pub fn transform(
        chunks: &[Chunk],
        chunk_to_graph: &ChunkToGraph,
        graph: Option<&GraphDocument>,
        repomap: Option<&RepoMapSnapshot>,
    ) -> Vec<IndexDocument> {
        // chunk_id → repomap node, via the node's chunk_ids back-references
        let node_by_chunk: HashMap<&str, _> = repomap
            .map(|snapshot| {
                snapshot
                    .nodes
                    .iter()
                    .flat_map(|n| n.chunk_ids.iter().map(move |cid| (cid.as_str(), n)))
                    .collect()
            })
            .unwrap_or_default();

        chunks
            .iter()
            .filter(|c| !c.is_deleted)
            .map(|chunk| {
                let graph_node_ids = chunk_to_graph
                    .get(&chunk.chunk_id)
                    .cloned()
                    .unwrap_or_default();

                let symbols: Vec<String> = match graph {
                    Some(graph) => graph_node_ids
                        .iter()
                        .filter_map(|gid| graph.get_node(gid))
                        .map(|n| n.name.clone())
                        .collect(),
                    None => Vec::new(),
                };

                let node = node_by_chunk.get(chunk.chunk_id.as_str());
                let summary = node
                    .and_then(|n| n.summary.as_ref())
                    .map(|s| s.detailed.clone())
                    .or_else(|| chunk.summary.clone());

                let title = chunk
                    .fqn
                    .rsplit('.')
                    .next()
                    .unwrap_or(&chunk.fqn)
                    .to_string();

                let body = match &summary {
                    Some(summary) => format!("{}\n{}", chunk.fqn, summary),
                    None => chunk.fqn.clone(),
                };

                IndexDocument {
                    id: chunk.chunk_id.clone(),
                    repo_id: chunk.repo_id.clone(),
                    snapshot_id: chunk.snapshot_id.clone(),
                    kind: chunk.kind,
                    fqn: chunk.fqn.clone(),
                    path: chunk.file_path.clone(),
                    language: chunk.language.clone(),
                    title,
                    body,
                    summary,
                    importance: node.map(|n| n.metrics.importance),
                    pagerank: node.map(|n| n.metrics.pagerank),
                    symbols,
                    graph_node_ids,
                    start_line: chunk.start_line,
                    end_line: chunk.end_line,
                    content_hash: chunk.content_hash.clone(),
                    attrs: chunk.attrs.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chunking::domain::ChunkKind;
    use crate::features::repomap::domain::{
        RepoMapKind, RepoMapNode, TwoLevelSummary,
    };

    #[test]
    fn test_transform_enriches_from_repomap() {
        let mut chunk = Chunk::new(
            "chunk:r:function:m.f".to_string(),
            "r".to_string(),
            "s".to_string(),
            ChunkKind::Function,
            "m.f".to_string(),
        );
        chunk.file_path = Some("m.py".to_string());

        let mut node = RepoMapNode::new("repomap:r:s:function:m.f", "r", "s", RepoMapKind::Function, "f");
        node.chunk_ids = vec!["chunk:r:function:m.f".to_string()];
        node.metrics.importance = 0.8;
        node.summary = Some(TwoLevelSummary::leaf("Runs f.", "Runs the f routine."));

        let snapshot = RepoMapSnapshot {
            repo_id: "r".into(),
            snapshot_id: "s".into(),
            root_node_id: node.id.clone(),
            nodes: vec![node],
            schema_version: "1.0".into(),
            created_at: None,
            metadata: HashMap::new(),
        };

        let docs = IndexTransformer::transform(
            &[chunk],
            &HashMap::new(),
            None,
            Some(&snapshot),
        );

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "f");
        assert_eq!(docs[0].importance, Some(0.8));
        assert_eq!(docs[0].summary.as_deref(), Some("Runs the f routine."));
        assert!(docs[0].body.contains("m.f"));
    }

    #[test]
    fn test_deleted_chunks_are_skipped() {
        let mut chunk = Chunk::new(
            "chunk:r:file:m".to_string(),
            "r".to_string(),
            "s".to_string(),
            ChunkKind::File,
            "m".to_string(),
        );
        chunk.is_deleted = true;

        let docs = IndexTransformer::transform(&[chunk], &HashMap::new(), None, None);
        assert!(docs.is_empty());
    }
}
