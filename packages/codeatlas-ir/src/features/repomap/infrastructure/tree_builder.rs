//! RepoMap Tree Builder
//!
//! Builds the RepoMap node tree from the chunk list:
//! 1. Create the repo root
//! 2. Synthesize dir nodes from file-path prefixes (depth ascending)
//! 3. Emit nodes for chunks in hierarchy order
//!    (repo → project → module → file → class → function)
//! 4. Aggregate LOC and symbol counts bottom-up in a single pass
//!
//! Parent resolution uses a chunk_id → node_id reverse index with a
//! path-based fallback for files and an FQN-based fallback for nested
//! symbols. Depth is always `parent.depth + 1`.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::features::chunking::domain::{Chunk, ChunkKind, ChunkToGraph};
use crate::features::repomap::domain::{
    RepoMapIdGenerator, RepoMapKind, RepoMapMetrics, RepoMapNode,
};

pub struct RepoMapTreeBuilder {
    repo_id: String,
    snapshot_id: String,
    nodes: HashMap<String, RepoMapNode>,
    /// Insertion order, parents before children
    order: Vec<String>,
    chunk_to_node: HashMap<String, String>,
    fqn_to_node: HashMap<(RepoMapKind, String), String>,
}

impl RepoMapTreeBuilder {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            nodes: HashMap::new(),
            order: Vec::new(),
            chunk_to_node: HashMap::new(),
            fqn_to_node: HashMap::new(),
        }
    }

    /// Build the tree; returns nodes with parents always preceding children
    pub fn build(&mut self, chunks: &[Chunk], chunk_to_graph: &ChunkToGraph) -> Vec<RepoMapNode> {
        self.nodes.clear();
        self.order.clear();
        self.chunk_to_node.clear();
        self.fqn_to_node.clear();

        let root_id = self.create_repo_root(chunks);
        self.create_dir_nodes(chunks, &root_id);
        self.create_chunk_nodes(chunks, chunk_to_graph, &root_id);
        self.aggregate_metrics();

        let mut out = Vec::with_capacity(self.order.len());
        for id in &self.order {
            if let Some(node) = self.nodes.get(id) {
                out.push(node.clone());
            }
        }
        debug!(nodes = out.len(), "repomap tree built");
        out
    }

    fn insert(&mut self, node: RepoMapNode) {
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    fn create_repo_root(&mut self, chunks: &[Chunk]) -> String {
        let root_id = RepoMapIdGenerator::repo_root(&self.repo_id, &self.snapshot_id);
        let mut root = RepoMapNode::new(
            root_id.clone(),
            self.repo_id.clone(),
            self.snapshot_id.clone(),
            RepoMapKind::Repo,
            self.repo_id.clone(),
        );
        if let Some(repo_chunk) = chunks.iter().find(|c| c.kind == ChunkKind::Repo) {
            root.chunk_ids = vec![repo_chunk.chunk_id.clone()];
            self.chunk_to_node
                .insert(repo_chunk.chunk_id.clone(), root_id.clone());
        }
        self.insert(root);
        root_id
    }

    /// Synthesize dir nodes from file path prefixes, shallowest first
    fn create_dir_nodes(&mut self, chunks: &[Chunk], root_id: &str) {
        let mut dir_paths: Vec<String> = chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::File)
            .filter_map(|c| c.file_path.as_deref())
            .flat_map(|path| {
                let mut prefixes = Vec::new();
                let mut current = std::path::Path::new(path).parent();
                while let Some(dir) = current {
                    let s = dir.to_string_lossy().to_string();
                    if !s.is_empty() && s != "." {
                        prefixes.push(s);
                    }
                    current = dir.parent();
                }
                prefixes
            })
            .collect();
        dir_paths.sort();
        dir_paths.dedup();
        dir_paths.sort_by_key(|p| p.matches('/').count());

        for dir_path in dir_paths {
            let dir_id = RepoMapIdGenerator::dir(&self.repo_id, &self.snapshot_id, &dir_path);
            if self.nodes.contains_key(&dir_id) {
                continue;
            }

            let parent_path = std::path::Path::new(&dir_path)
                .parent()
                .map(|p| p.to_string_lossy().to_string())
                .filter(|p| !p.is_empty() && p != ".");
            let parent_id = match parent_path {
                Some(p) => RepoMapIdGenerator::dir(&self.repo_id, &self.snapshot_id, &p),
                None => root_id.to_string(),
            };
            let parent_depth = self.nodes.get(&parent_id).map(|n| n.depth).unwrap_or(0);

            let name = std::path::Path::new(&dir_path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| dir_path.clone());

            let mut node = RepoMapNode::new(
                dir_id.clone(),
                self.repo_id.clone(),
                self.snapshot_id.clone(),
                RepoMapKind::Dir,
                name,
            );
            node.path = Some(dir_path);
            node.parent_id = Some(parent_id.clone());
            node.depth = parent_depth + 1;

            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.add_child(dir_id.clone());
            }
            self.insert(node);
        }
    }

    fn create_chunk_nodes(
        &mut self,
        chunks: &[Chunk],
        chunk_to_graph: &ChunkToGraph,
        root_id: &str,
    ) {
        // Hierarchy order so parents exist before children
        let mut sorted: Vec<&Chunk> = chunks.iter().filter(|c| !c.is_deleted).collect();
        sorted.sort_by_key(|c| (c.kind.hierarchy_level(), c.fqn.clone()));

        for chunk in sorted {
            if chunk.kind == ChunkKind::Repo {
                continue; // root already created
            }

            let (kind, identifier) = match chunk.kind {
                ChunkKind::Project => (RepoMapKind::Project, chunk.fqn.clone()),
                ChunkKind::Module => (
                    RepoMapKind::Module,
                    chunk.module_path.clone().unwrap_or_else(|| chunk.fqn.clone()),
                ),
                ChunkKind::File => (
                    RepoMapKind::File,
                    chunk.file_path.clone().unwrap_or_else(|| chunk.fqn.clone()),
                ),
                ChunkKind::Class => (RepoMapKind::Class, chunk.fqn.clone()),
                ChunkKind::Function => (RepoMapKind::Function, chunk.fqn.clone()),
                // Extended role kinds appear as symbols in the map
                _ => (RepoMapKind::Symbol, chunk.fqn.clone()),
            };
            if identifier.is_empty() {
                warn!(chunk = %chunk.chunk_id, "skipping chunk without identifier");
                continue;
            }

            let node_id =
                RepoMapIdGenerator::generate(&self.repo_id, &self.snapshot_id, kind, &identifier);
            if self.nodes.contains_key(&node_id) {
                continue;
            }

            let parent_id = self.resolve_parent(chunk, root_id);
            let parent_depth = self.nodes.get(&parent_id).map(|n| n.depth).unwrap_or(0);

            let name = chunk
                .fqn
                .rsplit('.')
                .next()
                .unwrap_or(&chunk.fqn)
                .to_string();

            let mut node = RepoMapNode::new(
                node_id.clone(),
                self.repo_id.clone(),
                self.snapshot_id.clone(),
                kind,
                name,
            );
            node.path = chunk.file_path.clone();
            node.fqn = Some(chunk.fqn.clone());
            node.parent_id = Some(parent_id.clone());
            node.depth = parent_depth + 1;
            node.chunk_ids = vec![chunk.chunk_id.clone()];
            node.graph_node_ids = chunk_to_graph
                .get(&chunk.chunk_id)
                .cloned()
                .unwrap_or_default();
            node.language = chunk.language.clone();
            node.is_test = chunk.is_test.unwrap_or(false);
            node.metrics = RepoMapMetrics {
                loc: chunk.line_count().unwrap_or(0) as usize,
                symbol_count: usize::from(!chunk.kind.is_structural()),
                ..Default::default()
            };

            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.add_child(node_id.clone());
            }
            self.chunk_to_node
                .insert(chunk.chunk_id.clone(), node_id.clone());
            self.fqn_to_node.insert((kind, chunk.fqn.clone()), node_id.clone());
            self.insert(node);
        }
    }

    /// O(1) parent lookup through the reverse index, with path/FQN fallbacks
    fn resolve_parent(&self, chunk: &Chunk, root_id: &str) -> String {
        if let Some(parent_chunk_id) = &chunk.parent_id {
            if let Some(node_id) = self.chunk_to_node.get(parent_chunk_id) {
                return node_id.clone();
            }
        }

        match chunk.kind {
            ChunkKind::File => {
                // Path-based fallback: enclosing dir
                if let Some(path) = &chunk.file_path {
                    if let Some(parent) = std::path::Path::new(path).parent() {
                        let p = parent.to_string_lossy();
                        if !p.is_empty() && p != "." {
                            let dir_id =
                                RepoMapIdGenerator::dir(&self.repo_id, &self.snapshot_id, &p);
                            if self.nodes.contains_key(&dir_id) {
                                return dir_id;
                            }
                        }
                    }
                }
            }
            ChunkKind::Function | ChunkKind::Class => {
                // FQN-based fallback: enclosing class, then file
                if let Some((prefix, _)) = chunk.fqn.rsplit_once('.') {
                    if let Some(node_id) =
                        self.fqn_to_node.get(&(RepoMapKind::Class, prefix.to_string()))
                    {
                        return node_id.clone();
                    }
                }
                if let Some(path) = &chunk.file_path {
                    let file_id = RepoMapIdGenerator::file(&self.repo_id, &self.snapshot_id, path);
                    if self.nodes.contains_key(&file_id) {
                        return file_id;
                    }
                }
            }
            _ => {}
        }

        root_id.to_string()
    }

    /// Single-pass bottom-up aggregation: sort by depth descending, each
    /// node adds to its parent exactly once. O(N log N) instead of O(N·H).
    ///
    /// LOC propagates only through container nodes; a function's lines are
    /// already inside its file's span, so symbol nodes do not re-add them.
    /// Symbol counts propagate everywhere.
    fn aggregate_metrics(&mut self) {
        let mut ids: Vec<String> = self.order.clone();
        ids.sort_by_key(|id| {
            let depth = self.nodes.get(id).map(|n| n.depth).unwrap_or(0);
            (std::cmp::Reverse(depth), id.clone())
        });

        for id in ids {
            let Some(node) = self.nodes.get(&id) else { continue };
            let Some(parent_id) = node.parent_id.clone() else {
                continue;
            };
            let loc = node.metrics.loc;
            let symbols = node.metrics.symbol_count;
            let child_is_container = node.kind.is_container();

            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.metrics.symbol_count += symbols;
                if child_is_container {
                    parent.metrics.loc += loc;
                }
            }
        }
    }
}
