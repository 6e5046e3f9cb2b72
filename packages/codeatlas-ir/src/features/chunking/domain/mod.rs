//! Chunking domain models

pub mod chunk;
pub mod chunk_id_generator;
pub mod chunk_kind;
pub mod refresh;

pub use chunk::{Chunk, ChunkId, ChunkToGraph, ChunkToIr, GraphNodeId, IrNodeId};
pub use chunk_id_generator::{normalize_fqn, ChunkIdContext, ChunkIdGenerator, GeneratedId};
pub use chunk_kind::ChunkKind;
pub use refresh::{ChunkDiffKind, ChunkRefreshResult, RenamedChunk};
