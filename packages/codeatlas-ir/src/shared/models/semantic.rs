//! Semantic IR models
//!
//! Decorations over the structural IR: types, signatures, a control-flow
//! graph per function and a data-flow summary. Produced by the parser port
//! alongside the IR document; consumed by the graph builder.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Span;

/// A named type entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEntity {
    pub id: String,
    pub name: String,
    pub fqn: String,
    pub file_path: Option<String>,
    pub span: Option<Span>,
    /// Ids of IR nodes using this type
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,
}

/// A function signature entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntity {
    pub id: String,
    /// IR node id of the function this signature belongs to
    pub function_id: String,
    pub fqn: String,
    pub param_type_ids: Vec<String>,
    pub return_type_id: Option<String>,
    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,
}

/// A basic block of a function's control-flow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgBlock {
    pub id: String,
    /// IR node id of the enclosing function
    pub function_id: String,
    pub span: Option<Span>,
    /// Variables defined (written) in this block
    #[serde(default)]
    pub defined_variable_ids: Vec<String>,
    /// Variables used (read) in this block
    #[serde(default)]
    pub used_variable_ids: Vec<String>,
}

/// CFG transition subkind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CfgEdgeSubkind {
    Next,
    Branch,
    Loop,
    Handler,
}

/// A CFG transition between two blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub source_block_id: String,
    pub target_block_id: String,
    pub subkind: CfgEdgeSubkind,
}

/// A variable tracked by the data-flow summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfgVariable {
    pub id: String,
    pub name: String,
    /// IR node id of the enclosing function, if local
    pub function_id: Option<String>,
    pub span: Option<Span>,
}

/// Def/use event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DfgEventKind {
    Def,
    Use,
}

/// A single def/use event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfgEvent {
    pub variable_id: String,
    pub block_id: String,
    pub kind: DfgEventKind,
}

/// Data-flow snapshot for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DfgSnapshot {
    pub variables: Vec<DfgVariable>,
    pub events: Vec<DfgEvent>,
}

/// Semantic decoration of one IR document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticSnapshot {
    pub types: Vec<TypeEntity>,
    pub signatures: Vec<SignatureEntity>,
    pub cfg_blocks: Vec<CfgBlock>,
    pub cfg_edges: Vec<CfgEdge>,
    pub dfg: DfgSnapshot,
}

impl SemanticSnapshot {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.signatures.is_empty()
            && self.cfg_blocks.is_empty()
            && self.cfg_edges.is_empty()
            && self.dfg.variables.is_empty()
    }
}
