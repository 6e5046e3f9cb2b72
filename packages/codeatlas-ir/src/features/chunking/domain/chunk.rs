//! Chunk Data Model
//!
//! Symbol-first hierarchical chunking for RAG.
//!
//! Hierarchy:
//!     Repo → Project → Module → File → Class → Function

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ChunkKind;

/// A chunk represents a hierarchical unit of code for RAG
///
/// # ID format
/// `chunk:{repo_id}:{kind}:{fqn}` with an optional `:{hash8}` suffix on
/// collisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub chunk_id: String,
    pub repo_id: String,
    /// Git commit hash or equivalent
    pub snapshot_id: String,
    pub project_id: Option<String>,
    pub module_path: Option<String>,
    pub file_path: Option<String>,

    pub kind: ChunkKind,
    /// Fully qualified dotted name
    pub fqn: String,

    // Line range (current snapshot)
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,

    // Original line range at first index (for span drift detection)
    pub original_start_line: Option<u32>,
    pub original_end_line: Option<u32>,

    /// Hash of the raw text of the chunk's span
    pub content_hash: Option<String>,

    pub parent_id: Option<String>,
    pub children: Vec<String>,

    pub language: Option<String>,
    /// "public" | "internal" | "private"
    pub symbol_visibility: Option<String>,

    /// Symbol this chunk represents
    pub symbol_id: Option<String>,
    /// Actual definition symbol; differs from symbol_id only for
    /// re-exports/wrappers
    pub symbol_owner_id: Option<String>,

    pub summary: Option<String>,
    pub importance: Option<f32>,
    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,

    // Versioning (for incremental updates)
    pub version: i32,
    pub last_indexed_commit: Option<String>,
    pub is_deleted: bool,

    /// True if this is a test function/class
    pub is_test: Option<bool>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self {
            chunk_id: String::new(),
            repo_id: String::new(),
            snapshot_id: "default".to_string(),
            project_id: None,
            module_path: None,
            file_path: None,
            kind: ChunkKind::File,
            fqn: String::new(),
            start_line: None,
            end_line: None,
            original_start_line: None,
            original_end_line: None,
            content_hash: None,
            parent_id: None,
            children: Vec::new(),
            language: None,
            symbol_visibility: None,
            symbol_id: None,
            symbol_owner_id: None,
            summary: None,
            importance: None,
            attrs: HashMap::new(),
            version: 1,
            last_indexed_commit: None,
            is_deleted: false,
            is_test: None,
        }
    }
}

impl Chunk {
    pub fn new(
        chunk_id: String,
        repo_id: String,
        snapshot_id: String,
        kind: ChunkKind,
        fqn: String,
    ) -> Self {
        Self {
            chunk_id,
            repo_id,
            snapshot_id,
            kind,
            fqn,
            ..Default::default()
        }
    }

    pub fn has_line_range(&self) -> bool {
        self.start_line.is_some() && self.end_line.is_some()
    }

    pub fn line_count(&self) -> Option<u32> {
        match (self.start_line, self.end_line) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start) + 1),
            _ => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.kind.is_structural()
    }

    /// Absolute drift of the current span from the original
    pub fn span_drift(&self) -> u32 {
        match (self.start_line, self.original_start_line) {
            (Some(current), Some(original)) => current.abs_diff(original),
            _ => 0,
        }
    }

    pub fn add_child(&mut self, child_id: String) {
        if !self.children.contains(&child_id) {
            self.children.push(child_id);
        }
    }
}

/// Type aliases for mappings
pub type ChunkId = String;
pub type GraphNodeId = String;
pub type IrNodeId = String;

pub type ChunkToGraph = HashMap<ChunkId, Vec<GraphNodeId>>;
pub type ChunkToIr = HashMap<ChunkId, Vec<IrNodeId>>;
