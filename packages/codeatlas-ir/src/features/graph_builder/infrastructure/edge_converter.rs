// Edge Converter - IR relations → Graph Edges
//
// Containment is derived from file paths and FQN prefixes; unresolved
// imports and calls target lazily-created external nodes. An edge whose
// endpoint is missing from the node map is dropped with a warning, never
// failing the build.

use ahash::AHashMap;
use tracing::warn;

use crate::features::graph_builder::domain::{GraphEdge, GraphNode};
use crate::shared::models::{
    CfgEdgeSubkind, GraphEdgeKind, GraphNodeKind, IrDocument, IrNodeKind, IrRelationKind,
    SemanticSnapshot,
};

/// Sequential edge-id generator, scoped to one build
#[derive(Debug, Default)]
pub struct EdgeIdGen {
    next: usize,
}

impl EdgeIdGen {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    fn generate(&mut self, kind: GraphEdgeKind) -> String {
        let id = format!("edge:{}:{}", kind.as_str().to_lowercase(), self.next);
        self.next += 1;
        id
    }
}

pub struct EdgeConverter;

impl EdgeConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert all edges of one IR document
    ///
    /// Returns the edges plus any external nodes created on demand. The node
    /// map must already contain every node of the snapshot (serial merge
    /// inserts nodes for all files before edges are converted).
    pub fn convert_edges(
        &self,
        ir_doc: &IrDocument,
        semantic: Option<&SemanticSnapshot>,
        nodes: &AHashMap<String, GraphNode>,
        id_gen: &mut EdgeIdGen,
    ) -> (Vec<GraphEdge>, Vec<GraphNode>) {
        let mut edges = Vec::new();
        let mut externals: Vec<GraphNode> = Vec::new();

        self.emit_containment_edges(ir_doc, nodes, id_gen, &mut edges);
        self.emit_import_edges(ir_doc, nodes, id_gen, &mut edges, &mut externals);
        self.emit_call_edges(ir_doc, nodes, id_gen, &mut edges, &mut externals);
        self.emit_relation_edges(ir_doc, nodes, id_gen, &mut edges);

        if let Some(semantic) = semantic {
            self.emit_semantic_edges(semantic, nodes, id_gen, &mut edges);
        }

        (edges, externals)
    }

    /// CONTAINS for every hierarchy link: module chain, module → file,
    /// file → class/function, class → method
    fn emit_containment_edges(
        &self,
        ir_doc: &IrDocument,
        nodes: &AHashMap<String, GraphNode>,
        id_gen: &mut EdgeIdGen,
        edges: &mut Vec<GraphEdge>,
    ) {
        // Module chain from path segments
        let segments: Vec<&str> = std::path::Path::new(&ir_doc.file_path)
            .parent()
            .map(|p| p.iter().filter_map(|s| s.to_str()).collect())
            .unwrap_or_default();

        let mut prev_module_id: Option<String> = None;
        let mut fqn = String::new();
        for segment in &segments {
            if fqn.is_empty() {
                fqn = segment.to_string();
            } else {
                fqn = format!("{}.{}", fqn, segment);
            }
            let module_id = format!("module:{}:{}", ir_doc.repo_id, fqn);
            if let Some(prev) = &prev_module_id {
                self.push_checked(
                    GraphEdgeKind::Contains,
                    prev,
                    &module_id,
                    nodes,
                    id_gen,
                    edges,
                );
            }
            prev_module_id = Some(module_id);
        }

        // Deepest module contains the file node
        let file_node = ir_doc.nodes.iter().find(|n| n.kind == IrNodeKind::File);
        if let (Some(module_id), Some(file)) = (&prev_module_id, file_node) {
            self.push_checked(
                GraphEdgeKind::Contains,
                module_id,
                &file.id,
                nodes,
                id_gen,
                edges,
            );
        }

        // File contains top-level classes/functions; classes contain methods.
        // Method parents are resolved by FQN prefix.
        let class_by_fqn: AHashMap<&str, &str> = ir_doc
            .nodes
            .iter()
            .filter(|n| n.kind == IrNodeKind::Class)
            .map(|n| (n.fqn.as_str(), n.id.as_str()))
            .collect();

        for node in &ir_doc.nodes {
            match node.kind {
                IrNodeKind::Class | IrNodeKind::Function | IrNodeKind::Variable => {
                    // Nested classes attach to the enclosing class when the
                    // FQN prefix matches one, otherwise to the file.
                    let parent_id = self
                        .parent_class_id(&node.fqn, &class_by_fqn)
                        .map(|s| s.to_string())
                        .or_else(|| file_node.map(|f| f.id.clone()));
                    if let Some(parent_id) = parent_id {
                        if parent_id != node.id {
                            self.push_checked(
                                GraphEdgeKind::Contains,
                                &parent_id,
                                &node.id,
                                nodes,
                                id_gen,
                                edges,
                            );
                        }
                    }
                }
                IrNodeKind::Method => {
                    if let Some(class_id) = self.parent_class_id(&node.fqn, &class_by_fqn) {
                        self.push_checked(
                            GraphEdgeKind::Contains,
                            class_id,
                            &node.id,
                            nodes,
                            id_gen,
                            edges,
                        );
                    } else if let Some(file) = file_node {
                        self.push_checked(
                            GraphEdgeKind::Contains,
                            &file.id,
                            &node.id,
                            nodes,
                            id_gen,
                            edges,
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn parent_class_id<'a>(
        &self,
        fqn: &str,
        class_by_fqn: &AHashMap<&str, &'a str>,
    ) -> Option<&'a str> {
        let parent_fqn = fqn.rsplit_once('.').map(|(prefix, _)| prefix)?;
        class_by_fqn.get(parent_fqn).copied()
    }

    fn emit_import_edges(
        &self,
        ir_doc: &IrDocument,
        nodes: &AHashMap<String, GraphNode>,
        id_gen: &mut EdgeIdGen,
        edges: &mut Vec<GraphEdge>,
        externals: &mut Vec<GraphNode>,
    ) {
        for import in &ir_doc.imports {
            let target_id = match &import.resolved_module_id {
                Some(id) => id.clone(),
                None => {
                    let ext = self.external_node(
                        ir_doc,
                        GraphNodeKind::ExternalModule,
                        &import.module_name,
                        nodes,
                        externals,
                    );
                    ext
                }
            };

            if !nodes.contains_key(&import.source_id) {
                warn!(
                    source = %import.source_id,
                    module = %import.module_name,
                    "dropping IMPORTS edge: source node missing"
                );
                continue;
            }
            let target_exists = nodes.contains_key(&target_id)
                || externals.iter().any(|n| n.id == target_id);
            if !target_exists {
                warn!(target = %target_id, "dropping IMPORTS edge: target node missing");
                continue;
            }

            edges.push(GraphEdge::new(
                id_gen.generate(GraphEdgeKind::Imports),
                GraphEdgeKind::Imports,
                import.source_id.clone(),
                target_id,
            ));
        }
    }

    fn emit_call_edges(
        &self,
        ir_doc: &IrDocument,
        nodes: &AHashMap<String, GraphNode>,
        id_gen: &mut EdgeIdGen,
        edges: &mut Vec<GraphEdge>,
        externals: &mut Vec<GraphNode>,
    ) {
        for call in &ir_doc.calls {
            let target_id = match &call.resolved_callee_id {
                Some(id) => id.clone(),
                None => self.external_node(
                    ir_doc,
                    GraphNodeKind::ExternalFunction,
                    &call.callee_name,
                    nodes,
                    externals,
                ),
            };

            if !nodes.contains_key(&call.caller_id) {
                warn!(
                    caller = %call.caller_id,
                    callee = %call.callee_name,
                    "dropping CALLS edge: caller node missing"
                );
                continue;
            }
            let target_exists = nodes.contains_key(&target_id)
                || externals.iter().any(|n| n.id == target_id);
            if !target_exists {
                warn!(target = %target_id, "dropping CALLS edge: callee node missing");
                continue;
            }

            edges.push(GraphEdge::new(
                id_gen.generate(GraphEdgeKind::Calls),
                GraphEdgeKind::Calls,
                call.caller_id.clone(),
                target_id,
            ));
        }
    }

    fn emit_relation_edges(
        &self,
        ir_doc: &IrDocument,
        nodes: &AHashMap<String, GraphNode>,
        id_gen: &mut EdgeIdGen,
        edges: &mut Vec<GraphEdge>,
    ) {
        for relation in &ir_doc.relations {
            let kind = match relation.kind {
                IrRelationKind::Inherits => GraphEdgeKind::Inherits,
                IrRelationKind::Implements => GraphEdgeKind::Implements,
                IrRelationKind::ReferencesType => GraphEdgeKind::ReferencesType,
                IrRelationKind::ReferencesSymbol => GraphEdgeKind::ReferencesSymbol,
                IrRelationKind::Instantiates => GraphEdgeKind::Instantiates,
                IrRelationKind::Decorates => GraphEdgeKind::Decorates,
                IrRelationKind::RouteHandler => GraphEdgeKind::RouteHandler,
                IrRelationKind::HandlesRequest => GraphEdgeKind::HandlesRequest,
                IrRelationKind::UsesRepository => GraphEdgeKind::UsesRepository,
                IrRelationKind::MiddlewareNext => GraphEdgeKind::MiddlewareNext,
            };

            if !nodes.contains_key(&relation.source_id) || !nodes.contains_key(&relation.target_id)
            {
                warn!(
                    kind = %kind,
                    source = %relation.source_id,
                    target = %relation.target_id,
                    "dropping edge: endpoint missing"
                );
                continue;
            }

            let mut edge = GraphEdge::new(
                id_gen.generate(kind),
                kind,
                relation.source_id.clone(),
                relation.target_id.clone(),
            );
            for (k, v) in &relation.attrs {
                edge.attrs.insert(k.clone(), v.clone());
            }
            edges.push(edge);
        }
    }

    /// READS/WRITES from CFG blocks, CFG transition edges, type references
    /// and function → signature/block containment
    fn emit_semantic_edges(
        &self,
        semantic: &SemanticSnapshot,
        nodes: &AHashMap<String, GraphNode>,
        id_gen: &mut EdgeIdGen,
        edges: &mut Vec<GraphEdge>,
    ) {
        for ty in &semantic.types {
            for user_id in &ty.user_ids {
                if !nodes.contains_key(user_id) || !nodes.contains_key(&ty.id) {
                    warn!(type_id = %ty.id, user = %user_id, "dropping REFERENCES_TYPE edge");
                    continue;
                }
                edges.push(GraphEdge::new(
                    id_gen.generate(GraphEdgeKind::ReferencesType),
                    GraphEdgeKind::ReferencesType,
                    user_id.clone(),
                    ty.id.clone(),
                ));
            }
        }

        for sig in &semantic.signatures {
            self.push_checked(
                GraphEdgeKind::Contains,
                &sig.function_id,
                &sig.id,
                nodes,
                id_gen,
                edges,
            );
        }

        for block in &semantic.cfg_blocks {
            self.push_checked(
                GraphEdgeKind::Contains,
                &block.function_id,
                &block.id,
                nodes,
                id_gen,
                edges,
            );

            // READS / WRITES carry the enclosing function id for downstream
            // indices.
            for (kind, var_ids) in [
                (GraphEdgeKind::Reads, &block.used_variable_ids),
                (GraphEdgeKind::Writes, &block.defined_variable_ids),
            ] {
                for var_id in var_ids {
                    if !nodes.contains_key(var_id) {
                        warn!(variable = %var_id, kind = %kind, "dropping data-flow edge");
                        continue;
                    }
                    let mut edge = GraphEdge::new(
                        id_gen.generate(kind),
                        kind,
                        block.id.clone(),
                        var_id.clone(),
                    );
                    edge.attrs.insert(
                        "function_id".to_string(),
                        serde_json::Value::String(block.function_id.clone()),
                    );
                    edges.push(edge);
                }
            }
        }

        for cfg_edge in &semantic.cfg_edges {
            let kind = match cfg_edge.subkind {
                CfgEdgeSubkind::Next => GraphEdgeKind::CfgNext,
                CfgEdgeSubkind::Branch => GraphEdgeKind::CfgBranch,
                CfgEdgeSubkind::Loop => GraphEdgeKind::CfgLoop,
                CfgEdgeSubkind::Handler => GraphEdgeKind::CfgHandler,
            };
            self.push_checked(
                kind,
                &cfg_edge.source_block_id,
                &cfg_edge.target_block_id,
                nodes,
                id_gen,
                edges,
            );
        }
    }

    /// Push an edge when both endpoints exist, warn and drop otherwise
    fn push_checked(
        &self,
        kind: GraphEdgeKind,
        source_id: &str,
        target_id: &str,
        nodes: &AHashMap<String, GraphNode>,
        id_gen: &mut EdgeIdGen,
        edges: &mut Vec<GraphEdge>,
    ) {
        if !nodes.contains_key(source_id) || !nodes.contains_key(target_id) {
            warn!(kind = %kind, source = %source_id, target = %target_id, "dropping edge: endpoint missing");
            return;
        }
        edges.push(GraphEdge::new(
            id_gen.generate(kind),
            kind,
            source_id.to_string(),
            target_id.to_string(),
        ));
    }

    /// Find or create an external node, returning its id
    fn external_node(
        &self,
        ir_doc: &IrDocument,
        kind: GraphNodeKind,
        name: &str,
        nodes: &AHashMap<String, GraphNode>,
        externals: &mut Vec<GraphNode>,
    ) -> String {
        let prefix = match kind {
            GraphNodeKind::ExternalModule => "external:module",
            _ => "external:function",
        };
        let id = format!("{}:{}", prefix, name);

        let exists = nodes.contains_key(&id) || externals.iter().any(|n| n.id == id);
        if !exists {
            externals.push(GraphNode {
                id: id.clone(),
                kind,
                repo_id: ir_doc.repo_id.clone(),
                snapshot_id: None,
                fqn: name.to_string(),
                name: name.rsplit('.').next().unwrap_or(name).to_string(),
                path: None,
                span: None,
                attrs: AHashMap::new(),
            });
        }
        id
    }
}

impl Default for EdgeConverter {
    fn default() -> Self {
        Self::new()
    }
}
