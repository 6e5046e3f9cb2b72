// Graph Builder - serial merge of per-file IR into one GraphDocument
//
// Stages 1-3 (parse → IR → semantic IR) run per file in parallel; this
// builder is the single task that consumes all of them and produces the
// snapshot graph, then builds every index in one pass.

use ahash::AHashMap;
use dashmap::DashMap;
use tracing::{debug, info};

use super::edge_converter::{EdgeConverter, EdgeIdGen};
use super::index_builder::IndexBuilder;
use super::node_converter::NodeConverter;
use crate::features::graph_builder::domain::{GraphDocument, GraphNode};
use crate::shared::models::{IrDocument, SemanticSnapshot};

/// Graph builder error
#[derive(Debug, thiserror::Error)]
pub enum GraphBuilderError {
    #[error("Node conversion failed: {0}")]
    NodeConversion(String),

    #[error("Edge conversion failed: {0}")]
    EdgeConversion(String),

    #[error("Index building failed: {0}")]
    IndexBuild(String),

    #[error("Invalid IR document: {0}")]
    InvalidIrDocument(String),
}

/// Builds a GraphDocument from IR + semantic IR for a single snapshot
///
/// The module cache persists across files of one build so path-synthesized
/// module chains are emitted exactly once.
pub struct GraphBuilder {
    module_cache: DashMap<String, GraphNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            module_cache: DashMap::new(),
        }
    }

    /// Build the complete graph for one snapshot
    ///
    /// `documents` pairs each per-file IR document with its optional
    /// semantic snapshot. Edge emission order is deterministic for the same
    /// input: documents are processed in the given order and each
    /// converter's output order follows its input order.
    pub fn build(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        documents: &[(IrDocument, Option<SemanticSnapshot>)],
    ) -> Result<GraphDocument, GraphBuilderError> {
        let mut graph = GraphDocument::new(repo_id, snapshot_id);
        let node_converter = NodeConverter::new();
        let edge_converter = EdgeConverter::new();

        // Phase 1: IR nodes + synthesized modules
        for (ir_doc, _) in documents {
            let ir_nodes = node_converter.convert_ir_nodes(ir_doc)?;
            for node in ir_nodes {
                graph.graph_nodes.insert(node.id.clone(), node);
            }
            for node in node_converter.synthesize_module_nodes(ir_doc, &self.module_cache) {
                graph.graph_nodes.insert(node.id.clone(), node);
            }
        }

        // Phase 2: semantic nodes; a failing snapshot degrades to the
        // structural graph for that file
        for (ir_doc, semantic) in documents {
            let Some(semantic) = semantic else { continue };
            match node_converter.convert_semantic_nodes(ir_doc, semantic) {
                Ok(nodes) => {
                    for node in nodes {
                        graph.graph_nodes.insert(node.id.clone(), node);
                    }
                }
                Err(e) => {
                    debug!(file = %ir_doc.file_path, error = %e, "semantic node conversion failed");
                }
            }
        }

        // Phase 3: edges (lazy external nodes land in the node map first)
        let mut id_gen = EdgeIdGen::new();
        for (ir_doc, semantic) in documents {
            let (edges, externals) =
                edge_converter.convert_edges(ir_doc, semantic.as_ref(), &graph.graph_nodes, &mut id_gen);
            for node in externals {
                graph.graph_nodes.insert(node.id.clone(), node);
            }
            for edge in edges {
                graph.edge_by_id.insert(edge.id.clone(), edge.clone());
                graph.graph_edges.push(edge);
            }
        }

        // Phase 4: indexes
        let index_builder = IndexBuilder::new();
        graph.indexes = index_builder
            .build_indexes(&graph.graph_nodes, &graph.graph_edges)
            .map_err(|e| GraphBuilderError::IndexBuild(e.to_string()))?;
        graph.path_index = index_builder.build_path_index(&graph.graph_nodes);

        info!(
            nodes = graph.graph_nodes.len(),
            edges = graph.graph_edges.len(),
            "graph build complete"
        );

        Ok(graph)
    }

    /// Clear the module cache (for fresh builds)
    pub fn clear_cache(&self) {
        self.module_cache.clear();
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{
        CfgBlock, CfgEdge, CfgEdgeSubkind, DfgVariable, GraphEdgeKind, GraphNodeKind, IrCall,
        IrNode, IrNodeKind, Span,
    };

    fn sample_ir() -> IrDocument {
        let mut doc = IrDocument::new("repo", "snap", "app/service.py", "python");
        doc.nodes = vec![
            IrNode::new(
                "ir:file",
                IrNodeKind::File,
                "app.service",
                "service",
                "app/service.py",
                Span::lines(1, 40),
                "python",
            ),
            IrNode::new(
                "ir:cls",
                IrNodeKind::Class,
                "app.service.UserService",
                "UserService",
                "app/service.py",
                Span::lines(3, 30),
                "python",
            ),
            IrNode::new(
                "ir:m1",
                IrNodeKind::Method,
                "app.service.UserService.get",
                "get",
                "app/service.py",
                Span::lines(4, 10),
                "python",
            ),
            IrNode::new(
                "ir:f1",
                IrNodeKind::Function,
                "app.service.helper",
                "helper",
                "app/service.py",
                Span::lines(32, 40),
                "python",
            ),
        ];
        doc.calls = vec![IrCall {
            caller_id: "ir:m1".to_string(),
            callee_name: "app.service.helper".to_string(),
            resolved_callee_id: Some("ir:f1".to_string()),
            span: None,
        }];
        doc
    }

    #[test]
    fn test_build_structural_graph() {
        let builder = GraphBuilder::new();
        let graph = builder
            .build("repo", "snap", &[(sample_ir(), None)])
            .unwrap();

        // File, class, method, function + synthesized "app" module
        assert_eq!(graph.graph_nodes.len(), 5);
        assert!(graph.get_node("module:repo:app").is_some());

        // CONTAINS: app→file, file→class, class→method, file→function
        let contains = graph.get_edges_by_kind(GraphEdgeKind::Contains);
        assert_eq!(contains.len(), 4);

        // Call edge resolved in-repo
        let calls = graph.get_edges_by_kind(GraphEdgeKind::Calls);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].source_id, "ir:m1");
        assert_eq!(calls[0].target_id, "ir:f1");

        // Index consistency
        assert_eq!(
            graph.indexes.get_callers("ir:f1").unwrap(),
            &["ir:m1".to_string()]
        );
    }

    #[test]
    fn test_unresolved_call_creates_external_function() {
        let mut ir = sample_ir();
        ir.calls.push(IrCall {
            caller_id: "ir:f1".to_string(),
            callee_name: "requests.get".to_string(),
            resolved_callee_id: None,
            span: None,
        });

        let builder = GraphBuilder::new();
        let graph = builder.build("repo", "snap", &[(ir, None)]).unwrap();

        let ext = graph.get_node("external:function:requests.get").unwrap();
        assert_eq!(ext.kind, GraphNodeKind::ExternalFunction);
        assert!(ext.snapshot_id.is_none());
    }

    #[test]
    fn test_edge_with_missing_endpoint_is_dropped() {
        let mut ir = sample_ir();
        ir.calls.push(IrCall {
            caller_id: "ir:ghost".to_string(),
            callee_name: "x".to_string(),
            resolved_callee_id: Some("ir:f1".to_string()),
            span: None,
        });

        let builder = GraphBuilder::new();
        let graph = builder.build("repo", "snap", &[(ir, None)]).unwrap();

        // Only the valid call edge survives
        assert_eq!(graph.get_edges_by_kind(GraphEdgeKind::Calls).len(), 1);
        // Invariant: every retained edge has both endpoints
        for edge in &graph.graph_edges {
            assert!(graph.get_node(&edge.source_id).is_some(), "{}", edge.id);
            assert!(graph.get_node(&edge.target_id).is_some(), "{}", edge.id);
        }
    }

    #[test]
    fn test_cfg_and_dfg_edges() {
        let ir = sample_ir();
        let mut semantic = SemanticSnapshot::default();
        semantic.cfg_blocks = vec![
            CfgBlock {
                id: "cfg:b1".to_string(),
                function_id: "ir:f1".to_string(),
                span: None,
                defined_variable_ids: vec!["var:x".to_string()],
                used_variable_ids: vec![],
            },
            CfgBlock {
                id: "cfg:b2".to_string(),
                function_id: "ir:f1".to_string(),
                span: None,
                defined_variable_ids: vec![],
                used_variable_ids: vec!["var:x".to_string()],
            },
        ];
        semantic.cfg_edges = vec![CfgEdge {
            source_block_id: "cfg:b1".to_string(),
            target_block_id: "cfg:b2".to_string(),
            subkind: CfgEdgeSubkind::Branch,
        }];
        semantic.dfg.variables = vec![DfgVariable {
            id: "var:x".to_string(),
            name: "x".to_string(),
            function_id: Some("ir:f1".to_string()),
            span: None,
        }];

        let builder = GraphBuilder::new();
        let graph = builder
            .build("repo", "snap", &[(ir, Some(semantic))])
            .unwrap();

        assert_eq!(graph.get_edges_by_kind(GraphEdgeKind::CfgBranch).len(), 1);
        let writes = graph.get_edges_by_kind(GraphEdgeKind::Writes);
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].attrs.get("function_id").unwrap().as_str().unwrap(),
            "ir:f1"
        );

        // reads_by / writes_by map variable → CFG block set
        assert!(graph.indexes.writes_by.get("var:x").unwrap().contains("cfg:b1"));
        assert!(graph.indexes.reads_by.get("var:x").unwrap().contains("cfg:b2"));
        assert_eq!(graph.indexes.cfg_successors("cfg:b1"), vec!["cfg:b2"]);
    }

    #[test]
    fn test_deterministic_rebuild() {
        let builder_a = GraphBuilder::new();
        let builder_b = GraphBuilder::new();
        let a = builder_a.build("repo", "snap", &[(sample_ir(), None)]).unwrap();
        let b = builder_b.build("repo", "snap", &[(sample_ir(), None)]).unwrap();

        let ids_a: Vec<&String> = a.graph_edges.iter().map(|e| &e.id).collect();
        let ids_b: Vec<&String> = b.graph_edges.iter().map(|e| &e.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
