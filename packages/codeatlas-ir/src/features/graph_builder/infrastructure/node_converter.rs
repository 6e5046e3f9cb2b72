// Node Converter - IR Nodes → Graph Nodes
//
// Role-aware conversion plus module-chain synthesis from file paths.

use ahash::AHashMap;
use dashmap::DashMap;
use rayon::prelude::*;

use super::builder::GraphBuilderError;
use crate::features::graph_builder::domain::GraphNode;
use crate::shared::models::{GraphNodeKind, IrDocument, IrNode, IrNodeKind, SemanticSnapshot};

pub struct NodeConverter;

impl NodeConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert IR nodes of one document to GraphNodes (parallel per node)
    ///
    /// Import nodes are skipped here; they become IMPORTS edges.
    pub fn convert_ir_nodes(
        &self,
        ir_doc: &IrDocument,
    ) -> Result<Vec<GraphNode>, GraphBuilderError> {
        let nodes: Vec<GraphNode> = ir_doc
            .nodes
            .par_iter()
            .filter_map(|node| self.convert_single_node(node, ir_doc))
            .collect();

        Ok(nodes)
    }

    fn convert_single_node(&self, node: &IrNode, ir_doc: &IrDocument) -> Option<GraphNode> {
        let kind = match node.kind {
            IrNodeKind::File => GraphNodeKind::File,
            IrNodeKind::Module => GraphNodeKind::Module,
            IrNodeKind::Class => GraphNodeKind::Class,
            IrNodeKind::Function => GraphNodeKind::Function,
            IrNodeKind::Method => GraphNodeKind::Method,
            IrNodeKind::Variable => GraphNodeKind::Variable,
            // Imports become edges, not nodes
            IrNodeKind::Import => return None,
        };

        // Role wins over the plain kind; the graph layer owns this mapping.
        let kind = match node.role {
            Some(role) => GraphNodeKind::from_role(role),
            None => kind,
        };

        let mut attrs: AHashMap<String, serde_json::Value> = AHashMap::new();
        for (k, v) in &node.attrs {
            attrs.insert(k.clone(), v.clone());
        }
        attrs.insert(
            "language".to_string(),
            serde_json::Value::String(node.language.clone()),
        );

        Some(GraphNode {
            id: node.id.clone(),
            kind,
            repo_id: ir_doc.repo_id.clone(),
            snapshot_id: Some(ir_doc.snapshot_id.clone()),
            fqn: node.fqn.clone(),
            name: node.name.clone(),
            path: Some(node.file_path.clone()),
            span: Some(node.span),
            attrs,
        })
    }

    /// Synthesize module nodes from the segments of a file path
    ///
    /// `src/utils/helpers/text.py` yields `src`, `src.utils`,
    /// `src.utils.helpers`. The cache persists across files of one build so
    /// every module chain is emitted once.
    pub fn synthesize_module_nodes(
        &self,
        ir_doc: &IrDocument,
        module_cache: &DashMap<String, GraphNode>,
    ) -> Vec<GraphNode> {
        let mut created = Vec::new();

        let path = std::path::Path::new(&ir_doc.file_path);
        let segments: Vec<&str> = match path.parent() {
            Some(parent) => parent.iter().filter_map(|s| s.to_str()).collect(),
            None => return created,
        };

        let mut fqn = String::new();
        for segment in segments {
            if fqn.is_empty() {
                fqn = segment.to_string();
            } else {
                fqn = format!("{}.{}", fqn, segment);
            }

            let module_id = format!("module:{}:{}", ir_doc.repo_id, fqn);
            if module_cache.contains_key(&module_id) {
                continue;
            }

            let node = GraphNode {
                id: module_id.clone(),
                kind: GraphNodeKind::Module,
                repo_id: ir_doc.repo_id.clone(),
                snapshot_id: Some(ir_doc.snapshot_id.clone()),
                fqn: fqn.clone(),
                name: segment.to_string(),
                path: Some(fqn.replace('.', "/")),
                span: None,
                attrs: AHashMap::new(),
            };
            module_cache.insert(module_id, node.clone());
            created.push(node);
        }

        created
    }

    /// Convert semantic entities (types, signatures, CFG blocks, variables)
    pub fn convert_semantic_nodes(
        &self,
        ir_doc: &IrDocument,
        semantic: &SemanticSnapshot,
    ) -> Result<Vec<GraphNode>, GraphBuilderError> {
        let mut nodes = Vec::new();

        for ty in &semantic.types {
            nodes.push(GraphNode {
                id: ty.id.clone(),
                kind: GraphNodeKind::Type,
                repo_id: ir_doc.repo_id.clone(),
                snapshot_id: Some(ir_doc.snapshot_id.clone()),
                fqn: ty.fqn.clone(),
                name: ty.name.clone(),
                path: ty.file_path.clone(),
                span: ty.span,
                attrs: ty.attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            });
        }

        for sig in &semantic.signatures {
            let mut attrs: AHashMap<String, serde_json::Value> = sig
                .attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            attrs.insert(
                "function_id".to_string(),
                serde_json::Value::String(sig.function_id.clone()),
            );
            nodes.push(GraphNode {
                id: sig.id.clone(),
                kind: GraphNodeKind::Signature,
                repo_id: ir_doc.repo_id.clone(),
                snapshot_id: Some(ir_doc.snapshot_id.clone()),
                fqn: sig.fqn.clone(),
                name: sig.fqn.rsplit('.').next().unwrap_or(&sig.fqn).to_string(),
                path: None,
                span: None,
                attrs,
            });
        }

        for block in &semantic.cfg_blocks {
            let mut attrs = AHashMap::new();
            attrs.insert(
                "function_id".to_string(),
                serde_json::Value::String(block.function_id.clone()),
            );
            nodes.push(GraphNode {
                id: block.id.clone(),
                kind: GraphNodeKind::CfgBlock,
                repo_id: ir_doc.repo_id.clone(),
                snapshot_id: Some(ir_doc.snapshot_id.clone()),
                fqn: block.id.clone(),
                name: block.id.clone(),
                path: Some(ir_doc.file_path.clone()),
                span: block.span,
                attrs,
            });
        }

        for var in &semantic.dfg.variables {
            let mut attrs = AHashMap::new();
            if let Some(fid) = &var.function_id {
                attrs.insert(
                    "function_id".to_string(),
                    serde_json::Value::String(fid.clone()),
                );
            }
            nodes.push(GraphNode {
                id: var.id.clone(),
                kind: GraphNodeKind::Variable,
                repo_id: ir_doc.repo_id.clone(),
                snapshot_id: Some(ir_doc.snapshot_id.clone()),
                fqn: var.name.clone(),
                name: var.name.clone(),
                path: Some(ir_doc.file_path.clone()),
                span: var.span,
                attrs,
            });
        }

        Ok(nodes)
    }
}

impl Default for NodeConverter {
    fn default() -> Self {
        Self::new()
    }
}
