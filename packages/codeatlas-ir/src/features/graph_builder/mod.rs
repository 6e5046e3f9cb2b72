//! Graph builder feature
//!
//! Merges per-file IR + semantic IR into one GraphDocument with typed
//! nodes, typed edges and precomputed indexes.

pub mod domain;
pub mod infrastructure;

pub use domain::{GraphDocument, GraphEdge, GraphIndex, GraphNode, GraphStats, RequestFlow};
pub use infrastructure::{GraphBuilder, GraphBuilderError};
