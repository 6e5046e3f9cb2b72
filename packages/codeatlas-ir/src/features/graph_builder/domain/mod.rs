// Graph Builder Domain Models
//
// Pure domain models with zero infrastructure dependencies.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::models::{GraphEdgeKind, GraphNodeKind, Span};

// ============================================================
// Graph Node
// ============================================================

/// Graph node representing a code entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier, stable across snapshots for identical FQN+kind
    pub id: String,

    /// Node kind (File, Class, Function, Route, ...)
    pub kind: GraphNodeKind,

    pub repo_id: String,

    /// None for external nodes, which are snapshot-independent
    pub snapshot_id: Option<String>,

    /// Fully qualified name
    pub fqn: String,

    /// Simple name
    pub name: String,

    /// File path or module path (None for semantic nodes)
    pub path: Option<String>,

    /// Source location
    pub span: Option<Span>,

    /// Additional attributes (language-specific metadata), JSON at the boundary
    #[serde(default)]
    pub attrs: AHashMap<String, serde_json::Value>,
}

impl GraphNode {
    #[inline]
    pub fn is_external(&self) -> bool {
        self.kind.is_external()
    }

    /// Check if this node represents a callable entity
    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            GraphNodeKind::Function | GraphNodeKind::Method | GraphNodeKind::ExternalFunction
        )
    }

    /// Check if this node represents a type entity
    #[inline]
    pub fn is_type(&self) -> bool {
        matches!(self.kind, GraphNodeKind::Type | GraphNodeKind::Class)
    }
}

// ============================================================
// Graph Edge
// ============================================================

/// Graph edge representing a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Unique edge identifier
    pub id: String,

    /// Edge kind (CONTAINS, CALLS, READS, WRITES, ...)
    pub kind: GraphEdgeKind,

    pub source_id: String,
    pub target_id: String,

    /// Edge-specific metadata (e.g. enclosing function id on READS/WRITES)
    #[serde(default)]
    pub attrs: AHashMap<String, serde_json::Value>,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        kind: GraphEdgeKind,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            source_id: source_id.into(),
            target_id: target_id.into(),
            attrs: AHashMap::new(),
        }
    }
}

// ============================================================
// Graph Index
// ============================================================

/// Request flow tracking (Route → Handler → Service → Repository)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestFlow {
    pub handlers: Vec<String>,
    pub services: Vec<String>,
    pub repositories: Vec<String>,
}

impl RequestFlow {
    /// Ordered chain of handler/service/repository ids
    pub fn chain(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(
            self.handlers.len() + self.services.len() + self.repositories.len(),
        );
        out.extend(self.handlers.iter().cloned());
        out.extend(self.services.iter().cloned());
        out.extend(self.repositories.iter().cloned());
        out
    }
}

/// Precomputed indexes over nodes and edges
///
/// Rebuilt whenever the edge list mutates; reverse indexes are always
/// consistent with the forward edge list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphIndex {
    // Core reverse indexes (target → sources)
    /// Function → callers
    pub called_by: AHashMap<String, Vec<String>>,

    /// Module → importers
    pub imported_by: AHashMap<String, Vec<String>>,

    /// Parent → children (forward, CONTAINS)
    pub contains_children: AHashMap<String, Vec<String>>,

    /// Type → users
    pub type_users: AHashMap<String, Vec<String>>,

    /// Variable → CFG blocks reading it
    pub reads_by: AHashMap<String, AHashSet<String>>,

    /// Variable → CFG blocks writing it
    pub writes_by: AHashMap<String, AHashSet<String>>,

    // Adjacency indexes
    /// Node → outgoing edge ids
    pub outgoing: AHashMap<String, Vec<String>>,

    /// Node → incoming edge ids
    pub incoming: AHashMap<String, Vec<String>>,

    /// (node_id, kind) → target node ids
    pub outgoing_by_kind: AHashMap<(String, GraphEdgeKind), Vec<String>>,

    /// (node_id, kind) → source node ids
    pub incoming_by_kind: AHashMap<(String, GraphEdgeKind), Vec<String>>,

    // Extended indexes (framework awareness)
    /// Route path → route node ids
    pub routes_by_path: AHashMap<String, Vec<String>>,

    /// Domain tag → service node ids
    pub services_by_domain: AHashMap<String, Vec<String>>,

    /// Target node → decorator node ids
    pub decorators_by_target: AHashMap<String, Vec<String>>,

    /// Route id → request flow chain
    pub request_flow_index: AHashMap<String, RequestFlow>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get callers of a function (O(1))
    #[inline]
    pub fn get_callers(&self, function_id: &str) -> Option<&[String]> {
        self.called_by.get(function_id).map(|v| v.as_slice())
    }

    /// Get importers of a module (O(1))
    #[inline]
    pub fn get_importers(&self, module_id: &str) -> Option<&[String]> {
        self.imported_by.get(module_id).map(|v| v.as_slice())
    }

    /// Get children of a parent node (O(1))
    #[inline]
    pub fn get_children(&self, parent_id: &str) -> Option<&[String]> {
        self.contains_children.get(parent_id).map(|v| v.as_slice())
    }

    /// Get outgoing targets for an edge kind (O(1))
    #[inline]
    pub fn get_outgoing_by_kind(&self, node_id: &str, kind: GraphEdgeKind) -> Option<&[String]> {
        self.outgoing_by_kind
            .get(&(node_id.to_string(), kind))
            .map(|v| v.as_slice())
    }

    /// Get incoming sources for an edge kind (O(1))
    #[inline]
    pub fn get_incoming_by_kind(&self, node_id: &str, kind: GraphEdgeKind) -> Option<&[String]> {
        self.incoming_by_kind
            .get(&(node_id.to_string(), kind))
            .map(|v| v.as_slice())
    }

    /// CFG successors of a block (all CFG_* subkinds)
    pub fn cfg_successors(&self, block_id: &str) -> Vec<String> {
        let mut out = Vec::new();
        for kind in [
            GraphEdgeKind::CfgNext,
            GraphEdgeKind::CfgBranch,
            GraphEdgeKind::CfgLoop,
            GraphEdgeKind::CfgHandler,
        ] {
            if let Some(targets) = self.get_outgoing_by_kind(block_id, kind) {
                out.extend(targets.iter().cloned());
            }
        }
        out
    }
}

// ============================================================
// Graph Document
// ============================================================

/// Complete graph representation of one repository snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub repo_id: String,
    pub snapshot_id: String,

    /// All graph nodes, indexed by id
    pub graph_nodes: AHashMap<String, GraphNode>,

    /// All graph edges, in deterministic emission order
    pub graph_edges: Vec<GraphEdge>,

    /// Edge by id (O(1) lookup)
    pub edge_by_id: AHashMap<String, GraphEdge>,

    /// Reverse + adjacency indexes
    pub indexes: GraphIndex,

    /// File path → node ids
    pub path_index: AHashMap<String, AHashSet<String>>,
}

impl GraphDocument {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            graph_nodes: AHashMap::new(),
            graph_edges: Vec::new(),
            edge_by_id: AHashMap::new(),
            indexes: GraphIndex::new(),
            path_index: AHashMap::new(),
        }
    }

    #[inline]
    pub fn get_node(&self, node_id: &str) -> Option<&GraphNode> {
        self.graph_nodes.get(node_id)
    }

    /// Get nodes by kind (O(N) scan, use sparingly)
    pub fn get_nodes_by_kind(&self, kind: GraphNodeKind) -> Vec<&GraphNode> {
        self.graph_nodes
            .values()
            .filter(|n| n.kind == kind)
            .collect()
    }

    /// Get edges by kind (O(E) scan, use sparingly)
    pub fn get_edges_by_kind(&self, kind: GraphEdgeKind) -> Vec<&GraphEdge> {
        self.graph_edges.iter().filter(|e| e.kind == kind).collect()
    }

    #[inline]
    pub fn get_node_ids_by_path(&self, file_path: &str) -> Option<&AHashSet<String>> {
        self.path_index.get(file_path)
    }

    #[inline]
    pub fn get_edge(&self, edge_id: &str) -> Option<&GraphEdge> {
        self.edge_by_id.get(edge_id)
    }

    /// Outgoing edges from a node (O(k))
    pub fn get_edges_from(&self, source_id: &str) -> Vec<&GraphEdge> {
        self.indexes
            .outgoing
            .get(source_id)
            .map(|edge_ids| {
                edge_ids
                    .iter()
                    .filter_map(|eid| self.edge_by_id.get(eid))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Incoming edges to a node (O(k))
    pub fn get_edges_to(&self, target_id: &str) -> Vec<&GraphEdge> {
        self.indexes
            .incoming
            .get(target_id)
            .map(|edge_ids| {
                edge_ids
                    .iter()
                    .filter_map(|eid| self.edge_by_id.get(eid))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_kind = HashMap::new();
        for node in self.graph_nodes.values() {
            *nodes_by_kind.entry(node.kind).or_insert(0) += 1;
        }

        let mut edges_by_kind = HashMap::new();
        for edge in &self.graph_edges {
            *edges_by_kind.entry(edge.kind).or_insert(0) += 1;
        }

        GraphStats {
            total_nodes: self.graph_nodes.len(),
            total_edges: self.graph_edges.len(),
            nodes_by_kind,
            edges_by_kind,
        }
    }
}

/// Graph statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub nodes_by_kind: HashMap<GraphNodeKind, usize>,
    pub edges_by_kind: HashMap<GraphEdgeKind, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: GraphNodeKind) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            kind,
            repo_id: "r".to_string(),
            snapshot_id: Some("s".to_string()),
            fqn: id.to_string(),
            name: id.to_string(),
            path: None,
            span: None,
            attrs: AHashMap::new(),
        }
    }

    #[test]
    fn test_document_lookup() {
        let mut doc = GraphDocument::new("r", "s");
        let n = node("f1", GraphNodeKind::Function);
        doc.graph_nodes.insert(n.id.clone(), n);

        assert!(doc.get_node("f1").is_some());
        assert!(doc.get_node("missing").is_none());
        assert_eq!(doc.get_nodes_by_kind(GraphNodeKind::Function).len(), 1);
    }

    #[test]
    fn test_request_flow_chain_order() {
        let flow = RequestFlow {
            handlers: vec!["h".into()],
            services: vec!["s".into()],
            repositories: vec!["r".into()],
        };
        assert_eq!(flow.chain(), vec!["h", "s", "r"]);
    }
}
