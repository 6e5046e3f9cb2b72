//! Graph node kind enumeration

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NodeRole;

/// Kind of a node in the unified code graph
///
/// Extended kinds (Route..Middleware) are produced when the IR carries a
/// role tag; the graph layer is the single source of truth for that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphNodeKind {
    File,
    Module,
    Class,
    Function,
    Method,
    Type,
    Signature,
    CfgBlock,
    Variable,
    ExternalModule,
    ExternalFunction,
    Route,
    Service,
    Repository,
    Config,
    Job,
    Middleware,
    Summary,
}

impl GraphNodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphNodeKind::File => "File",
            GraphNodeKind::Module => "Module",
            GraphNodeKind::Class => "Class",
            GraphNodeKind::Function => "Function",
            GraphNodeKind::Method => "Method",
            GraphNodeKind::Type => "Type",
            GraphNodeKind::Signature => "Signature",
            GraphNodeKind::CfgBlock => "CfgBlock",
            GraphNodeKind::Variable => "Variable",
            GraphNodeKind::ExternalModule => "ExternalModule",
            GraphNodeKind::ExternalFunction => "ExternalFunction",
            GraphNodeKind::Route => "Route",
            GraphNodeKind::Service => "Service",
            GraphNodeKind::Repository => "Repository",
            GraphNodeKind::Config => "Config",
            GraphNodeKind::Job => "Job",
            GraphNodeKind::Middleware => "Middleware",
            GraphNodeKind::Summary => "Summary",
        }
    }

    /// Map a framework role tag to its graph kind
    pub fn from_role(role: NodeRole) -> Self {
        match role {
            NodeRole::Service => GraphNodeKind::Service,
            NodeRole::Repository => GraphNodeKind::Repository,
            NodeRole::Route => GraphNodeKind::Route,
            NodeRole::Config => GraphNodeKind::Config,
            NodeRole::Job => GraphNodeKind::Job,
            NodeRole::Middleware => GraphNodeKind::Middleware,
        }
    }

    /// Nodes that live outside the indexed repository
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            GraphNodeKind::ExternalModule | GraphNodeKind::ExternalFunction
        )
    }

    /// Role-derived kinds (framework/architecture awareness)
    pub fn is_role_kind(&self) -> bool {
        matches!(
            self,
            GraphNodeKind::Route
                | GraphNodeKind::Service
                | GraphNodeKind::Repository
                | GraphNodeKind::Config
                | GraphNodeKind::Job
                | GraphNodeKind::Middleware
        )
    }
}

impl fmt::Display for GraphNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
