//! Shared models

mod edge_kind;
mod ir;
mod node_kind;
pub mod semantic;
mod span;

pub use edge_kind::GraphEdgeKind;
pub use ir::{
    IrCall, IrDocument, IrImport, IrNode, IrNodeKind, IrRelation, IrRelationKind, NodeRole,
};
pub use node_kind::GraphNodeKind;
pub use semantic::{
    CfgBlock, CfgEdge, CfgEdgeSubkind, DfgEvent, DfgEventKind, DfgSnapshot, DfgVariable,
    SemanticSnapshot, SignatureEntity, TypeEntity,
};
pub use span::Span;

/// Node identifier type alias
pub type NodeId = String;
