//! RepoMap store port

use crate::errors::Result;
use crate::features::repomap::domain::{RepoMapNode, RepoMapSnapshot};

pub trait RepoMapStore: Send + Sync {
    /// Save a complete snapshot atomically
    fn save_snapshot(&self, snapshot: &RepoMapSnapshot) -> Result<()>;

    fn get_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<Option<RepoMapSnapshot>>;

    fn list_snapshots(&self, repo_id: &str) -> Result<Vec<String>>;

    fn delete_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<()>;

    fn get_node(&self, node_id: &str) -> Result<Option<RepoMapNode>>;

    fn get_nodes_by_path(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        path: &str,
    ) -> Result<Vec<RepoMapNode>>;

    fn get_nodes_by_fqn(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        fqn: &str,
    ) -> Result<Vec<RepoMapNode>>;

    /// Node plus all descendants
    fn get_subtree(&self, node_id: &str) -> Result<Vec<RepoMapNode>>;

    /// Top-k nodes by importance, descending
    fn get_topk_by_importance(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        k: usize,
    ) -> Result<Vec<RepoMapNode>>;
}
