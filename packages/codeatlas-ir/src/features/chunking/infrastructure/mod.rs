//! Chunking infrastructure

pub mod boundary_validator;
pub mod chunk_builder;
pub mod fqn_builder;
pub mod incremental;
pub mod mapper;
pub mod memory_store;
pub mod test_detector;
pub mod visibility;

pub use boundary_validator::{BoundaryError, ChunkBoundaryValidator};
pub use chunk_builder::{
    ChunkBuildOutput, ChunkBuilder, ChunkBuilderConfig, ChunkingError, FileInput,
};
pub use fqn_builder::FqnBuilder;
pub use incremental::{ChunkIncrementalRefresher, RefreshHooks, SPAN_DRIFT_THRESHOLD};
pub use mapper::{ChunkGraphMapper, ChunkGraphMapperConfig, ChunkMapper, GraphNodeFilter};
pub use memory_store::InMemoryChunkStore;
pub use test_detector::TestDetector;
pub use visibility::{Visibility, VisibilityExtractor};
