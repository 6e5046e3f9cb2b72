//! RepoMap domain models
//!
//! A ranked, hierarchical tree over the repository intended as an LLM
//! context map. Nodes extend the chunk hierarchy with synthesized directory
//! nodes, importance metrics and 2-level summaries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Node kind in the RepoMap hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoMapKind {
    Repo,
    Project,
    Module,
    Dir,
    File,
    Class,
    Function,
    Symbol,
}

impl RepoMapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoMapKind::Repo => "repo",
            RepoMapKind::Project => "project",
            RepoMapKind::Module => "module",
            RepoMapKind::Dir => "dir",
            RepoMapKind::File => "file",
            RepoMapKind::Class => "class",
            RepoMapKind::Function => "function",
            RepoMapKind::Symbol => "symbol",
        }
    }

    /// Container kinds aggregate their descendants' scores
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            RepoMapKind::Repo
                | RepoMapKind::Project
                | RepoMapKind::Module
                | RepoMapKind::Dir
                | RepoMapKind::File
        )
    }
}

impl fmt::Display for RepoMapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metrics for a RepoMap node
///
/// Computed from code structure (loc, symbol_count), graph topology
/// (edge_degree, pagerank), git history (change_freq) and runtime signals
/// (hot_score, error_score).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMapMetrics {
    /// Lines of code
    pub loc: usize,

    /// Number of symbols (functions, classes, ...)
    pub symbol_count: usize,

    /// Total in-degree + out-degree in the code graph
    pub edge_degree: usize,

    /// PageRank score (0.0 - 1.0)
    pub pagerank: f64,

    /// Git change frequency (commits per month)
    pub change_freq: f64,

    /// Runtime hotness score (0.0 - 1.0)
    pub hot_score: f64,

    /// Error frequency score (0.0 - 1.0)
    pub error_score: f64,

    /// Combined importance score (0.0 - 1.0)
    pub importance: f64,

    /// Span drift score propagated from the chunk layer (0.0 - 1.0)
    pub drift_score: f64,
}

/// 2-level hierarchical summary
///
/// Leaf nodes get both levels from their code; parent nodes aggregate the
/// overview lines of their most important children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoLevelSummary {
    /// One-line overview
    pub overview: String,
    /// 2-3 sentence detail
    pub detailed: String,
    /// Number of children aggregated (0 = leaf)
    pub aggregated_from: usize,
}

impl TwoLevelSummary {
    pub fn leaf(overview: impl Into<String>, detailed: impl Into<String>) -> Self {
        Self {
            overview: overview.into(),
            detailed: detailed.into(),
            aggregated_from: 0,
        }
    }
}

/// A node in the RepoMap tree
///
/// ID format: `repomap:{repo_id}:{snapshot_id}:{kind}:{path_or_fqn}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMapNode {
    pub id: String,
    pub repo_id: String,
    pub snapshot_id: String,
    pub kind: RepoMapKind,

    /// Display name
    pub name: String,

    /// File/directory path (for file/dir nodes)
    pub path: Option<String>,

    /// Fully qualified name (for symbol nodes)
    pub fqn: Option<String>,

    pub parent_id: Option<String>,
    pub children_ids: Vec<String>,

    /// Depth in tree; root is 0 and every child is parent + 1
    pub depth: usize,

    // Cross-references
    pub chunk_ids: Vec<String>,
    pub graph_node_ids: Vec<String>,

    pub metrics: RepoMapMetrics,

    pub summary: Option<TwoLevelSummary>,

    pub language: Option<String>,

    /// Route, main, CLI, handler...
    pub is_entrypoint: bool,
    pub is_test: bool,

    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,
}

impl RepoMapNode {
    pub fn new(
        id: impl Into<String>,
        repo_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        kind: RepoMapKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            kind,
            name: name.into(),
            path: None,
            fqn: None,
            parent_id: None,
            children_ids: Vec::new(),
            depth: 0,
            chunk_ids: Vec::new(),
            graph_node_ids: Vec::new(),
            metrics: RepoMapMetrics::default(),
            summary: None,
            language: None,
            is_entrypoint: false,
            is_test: false,
            attrs: HashMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none() && self.kind == RepoMapKind::Repo
    }

    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }

    pub fn add_child(&mut self, child_id: String) {
        if !self.children_ids.contains(&child_id) {
            self.children_ids.push(child_id);
        }
    }
}

/// A complete RepoMap snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMapSnapshot {
    pub repo_id: String,
    pub snapshot_id: String,
    pub root_node_id: String,
    pub nodes: Vec<RepoMapNode>,
    pub schema_version: String,
    /// ISO timestamp
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl RepoMapSnapshot {
    pub fn get_node(&self, node_id: &str) -> Option<&RepoMapNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn get_children(&self, node_id: &str) -> Vec<&RepoMapNode> {
        match self.get_node(node_id) {
            Some(node) => node
                .children_ids
                .iter()
                .filter_map(|id| self.get_node(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Node plus all descendants, depth-first
    pub fn get_subtree(&self, node_id: &str) -> Vec<&RepoMapNode> {
        let Some(node) = self.get_node(node_id) else {
            return Vec::new();
        };
        let mut out = vec![node];
        for child in self.get_children(node_id) {
            out.extend(self.get_subtree(&child.id));
        }
        out
    }

    /// Check the depth invariant: every non-root node's depth equals its
    /// parent's depth plus one
    pub fn validate_depths(&self) -> std::result::Result<(), Vec<String>> {
        let by_id: HashMap<&str, &RepoMapNode> =
            self.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut errors = Vec::new();
        for node in &self.nodes {
            match &node.parent_id {
                None => {
                    if node.depth != 0 {
                        errors.push(format!("root {} has depth {}", node.id, node.depth));
                    }
                }
                Some(parent_id) => match by_id.get(parent_id.as_str()) {
                    Some(parent) => {
                        if node.depth != parent.depth + 1 {
                            errors.push(format!(
                                "{} depth {} != parent {} depth {} + 1",
                                node.id, node.depth, parent.id, parent.depth
                            ));
                        }
                    }
                    None => errors.push(format!("{} references missing parent {}", node.id, parent_id)),
                },
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
