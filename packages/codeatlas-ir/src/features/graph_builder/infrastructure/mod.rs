//! Graph builder infrastructure

pub mod builder;
pub mod edge_converter;
pub mod index_builder;
pub mod node_converter;
pub mod topo;

pub use builder::{GraphBuilder, GraphBuilderError};
pub use edge_converter::{EdgeConverter, EdgeIdGen};
pub use index_builder::IndexBuilder;
pub use node_converter::NodeConverter;
pub use topo::{DependencyGroup, DependencyOrdering};
