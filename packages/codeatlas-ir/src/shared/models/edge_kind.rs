//! Graph edge kind enumeration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an edge in the unified code graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphEdgeKind {
    Contains,
    Imports,
    Calls,
    Inherits,
    Implements,
    ReferencesType,
    ReferencesSymbol,
    Reads,
    Writes,
    CfgNext,
    CfgBranch,
    CfgLoop,
    CfgHandler,
    RouteHandler,
    HandlesRequest,
    UsesRepository,
    MiddlewareNext,
    Instantiates,
    Decorates,
}

impl GraphEdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphEdgeKind::Contains => "CONTAINS",
            GraphEdgeKind::Imports => "IMPORTS",
            GraphEdgeKind::Calls => "CALLS",
            GraphEdgeKind::Inherits => "INHERITS",
            GraphEdgeKind::Implements => "IMPLEMENTS",
            GraphEdgeKind::ReferencesType => "REFERENCES_TYPE",
            GraphEdgeKind::ReferencesSymbol => "REFERENCES_SYMBOL",
            GraphEdgeKind::Reads => "READS",
            GraphEdgeKind::Writes => "WRITES",
            GraphEdgeKind::CfgNext => "CFG_NEXT",
            GraphEdgeKind::CfgBranch => "CFG_BRANCH",
            GraphEdgeKind::CfgLoop => "CFG_LOOP",
            GraphEdgeKind::CfgHandler => "CFG_HANDLER",
            GraphEdgeKind::RouteHandler => "ROUTE_HANDLER",
            GraphEdgeKind::HandlesRequest => "HANDLES_REQUEST",
            GraphEdgeKind::UsesRepository => "USES_REPOSITORY",
            GraphEdgeKind::MiddlewareNext => "MIDDLEWARE_NEXT",
            GraphEdgeKind::Instantiates => "INSTANTIATES",
            GraphEdgeKind::Decorates => "DECORATES",
        }
    }

    /// All kinds, in stable order (storage creates one relation table each)
    pub fn all() -> &'static [GraphEdgeKind] {
        &[
            GraphEdgeKind::Contains,
            GraphEdgeKind::Imports,
            GraphEdgeKind::Calls,
            GraphEdgeKind::Inherits,
            GraphEdgeKind::Implements,
            GraphEdgeKind::ReferencesType,
            GraphEdgeKind::ReferencesSymbol,
            GraphEdgeKind::Reads,
            GraphEdgeKind::Writes,
            GraphEdgeKind::CfgNext,
            GraphEdgeKind::CfgBranch,
            GraphEdgeKind::CfgLoop,
            GraphEdgeKind::CfgHandler,
            GraphEdgeKind::RouteHandler,
            GraphEdgeKind::HandlesRequest,
            GraphEdgeKind::UsesRepository,
            GraphEdgeKind::MiddlewareNext,
            GraphEdgeKind::Instantiates,
            GraphEdgeKind::Decorates,
        ]
    }

    pub fn is_cfg(&self) -> bool {
        matches!(
            self,
            GraphEdgeKind::CfgNext
                | GraphEdgeKind::CfgBranch
                | GraphEdgeKind::CfgLoop
                | GraphEdgeKind::CfgHandler
        )
    }
}

impl fmt::Display for GraphEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_screaming_snake() {
        let json = serde_json::to_string(&GraphEdgeKind::ReferencesType).unwrap();
        assert_eq!(json, "\"REFERENCES_TYPE\"");
        let back: GraphEdgeKind = serde_json::from_str("\"CFG_BRANCH\"").unwrap();
        assert_eq!(back, GraphEdgeKind::CfgBranch);
    }

    #[test]
    fn test_all_covers_every_kind() {
        assert_eq!(GraphEdgeKind::all().len(), 19);
    }
}
