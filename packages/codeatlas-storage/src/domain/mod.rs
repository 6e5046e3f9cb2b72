//! Domain layer: the graph store port
//!
//! One node collection plus one relationship table per edge kind. Node
//! attributes are serialized as JSON. UPSERTs are keyed by node id and by
//! `(source_id, target_id, kind)` for edges.

use async_trait::async_trait;

use codeatlas_ir::features::graph_builder::domain::{GraphDocument, GraphEdge, GraphNode};
use codeatlas_ir::shared::models::GraphNodeKind;

use crate::Result;

/// Storage port consumed by the indexing core
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// UPSERT all nodes, then all edges, batched and transactional per batch
    async fn save_graph(&self, doc: &GraphDocument) -> Result<()>;

    async fn query_node_by_id(&self, node_id: &str) -> Result<Option<GraphNode>>;

    /// Children of a node through CONTAINS edges
    async fn query_contains_children(&self, node_id: &str) -> Result<Vec<GraphNode>>;

    /// Callers of a function (CALLS sources)
    async fn query_called_by(&self, function_id: &str) -> Result<Vec<GraphNode>>;

    /// Importers of a module (IMPORTS sources)
    async fn query_imported_by(&self, module_id: &str) -> Result<Vec<GraphNode>>;

    /// CFG blocks reading a variable
    async fn query_reads_variable(&self, variable_id: &str) -> Result<Vec<GraphNode>>;

    /// CFG blocks writing a variable
    async fn query_writes_variable(&self, variable_id: &str) -> Result<Vec<GraphNode>>;

    /// Successor blocks across all CFG edge kinds
    async fn query_cfg_successors(&self, block_id: &str) -> Result<Vec<GraphNode>>;

    /// Delete nodes by id; edges touching them cascade
    async fn delete_nodes(&self, node_ids: &[String]) -> Result<usize>;

    /// Delete everything belonging to a repository
    async fn delete_repo(&self, repo_id: &str) -> Result<usize>;

    /// Delete one snapshot of a repository
    async fn delete_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<usize>;

    /// Delete nodes matching a filter; edges cascade
    async fn delete_nodes_by_filter(
        &self,
        repo_id: &str,
        snapshot_id: Option<&str>,
        kind: Option<GraphNodeKind>,
    ) -> Result<usize>;

    /// All edges of one node (either direction), for diagnostics
    async fn query_edges_of(&self, node_id: &str) -> Result<Vec<GraphEdge>>;
}
