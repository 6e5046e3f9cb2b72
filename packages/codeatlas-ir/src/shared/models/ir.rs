//! Intermediate representation models
//!
//! Language-agnostic description of structural code elements, produced per
//! file by the parser port. The graph builder merges IR documents from all
//! files of a snapshot into one GraphDocument.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Span;

/// Kind of an IR node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IrNodeKind {
    File,
    Module,
    Class,
    Function,
    Method,
    Import,
    Variable,
}

/// Framework role tag attached by language extractors
///
/// The graph layer is the single owner of role → node-kind mapping; the IR
/// only records what the extractor saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Service,
    Repository,
    Route,
    Config,
    Job,
    Middleware,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Service => "service",
            NodeRole::Repository => "repository",
            NodeRole::Route => "route",
            NodeRole::Config => "config",
            NodeRole::Job => "job",
            NodeRole::Middleware => "middleware",
        }
    }
}

/// A single IR node (definition-level granularity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrNode {
    /// Stable id chosen by the IR generator; identical FQN+kind yields the
    /// same id across snapshots
    pub id: String,
    pub kind: IrNodeKind,
    /// Fully qualified dotted name
    pub fqn: String,
    pub name: String,
    pub file_path: String,
    pub span: Span,
    pub language: String,
    pub role: Option<NodeRole>,
    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,
}

impl IrNode {
    pub fn new(
        id: impl Into<String>,
        kind: IrNodeKind,
        fqn: impl Into<String>,
        name: impl Into<String>,
        file_path: impl Into<String>,
        span: Span,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            fqn: fqn.into(),
            name: name.into(),
            file_path: file_path.into(),
            span,
            language: language.into(),
            role: None,
            attrs: HashMap::new(),
        }
    }

    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, IrNodeKind::Function | IrNodeKind::Method)
    }
}

/// An import recorded by the extractor
///
/// `resolved_module_id` is set when the import target is a module of this
/// repository; otherwise `module_name` identifies the external module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrImport {
    pub source_id: String,
    pub module_name: String,
    pub resolved_module_id: Option<String>,
    pub span: Option<Span>,
}

/// A call site recorded by the extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrCall {
    pub caller_id: String,
    pub callee_name: String,
    pub resolved_callee_id: Option<String>,
    pub span: Option<Span>,
}

/// Kind of a symbol-level relation carried by the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrRelationKind {
    Inherits,
    Implements,
    ReferencesType,
    ReferencesSymbol,
    Instantiates,
    Decorates,
    RouteHandler,
    HandlesRequest,
    UsesRepository,
    MiddlewareNext,
}

/// A resolved relation between two IR nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrRelation {
    pub kind: IrRelationKind,
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub attrs: HashMap<String, serde_json::Value>,
}

/// Per-file IR document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrDocument {
    pub repo_id: String,
    pub snapshot_id: String,
    pub file_path: String,
    pub language: String,
    /// Ordered definition list (order follows source position)
    pub nodes: Vec<IrNode>,
    pub imports: Vec<IrImport>,
    pub calls: Vec<IrCall>,
    pub relations: Vec<IrRelation>,
}

impl IrDocument {
    pub fn new(
        repo_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        file_path: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            file_path: file_path.into(),
            language: language.into(),
            nodes: Vec::new(),
            imports: Vec::new(),
            calls: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn node_by_id(&self, id: &str) -> Option<&IrNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ir_node_roundtrip() {
        let node = IrNode::new(
            "ir:f1",
            IrNodeKind::Function,
            "pkg.mod.foo",
            "foo",
            "pkg/mod.py",
            Span::lines(3, 9),
            "python",
        )
        .with_role(NodeRole::Route);

        let json = serde_json::to_string(&node).unwrap();
        let back: IrNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        let json = serde_json::to_string(&NodeRole::Repository).unwrap();
        assert_eq!(json, "\"repository\"");
    }
}
