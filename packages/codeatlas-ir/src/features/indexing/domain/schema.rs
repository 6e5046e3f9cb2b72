//! Flat index document schema
//!
//! One document per chunk, consumed by the downstream vector and lexical
//! indexes. Everything the retriever needs is denormalized here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::features::chunking::domain::ChunkKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Same id as the source chunk
    pub id: String,
    pub repo_id: String,
    pub snapshot_id: String,
    pub kind: ChunkKind,
    pub fqn: String,
    pub path: Option<String>,
    pub language: Option<String>,

    /// Display title (symbol name or file name)
    pub title: String,
    /// Text body for lexical indexing
    pub body: String,
    /// LLM summary when available
    pub summary: Option<String>,

    pub importance: Option<f64>,
    pub pagerank: Option<f64>,

    /// Symbol names contained in this chunk
    pub symbols: Vec<String>,
    /// Mapped graph node ids
    pub graph_node_ids: Vec<String>,

    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub content_hash: Option<String>,

    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,
}
