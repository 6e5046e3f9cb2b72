//! Chunking application layer

pub mod chunking_usecase;

pub use chunking_usecase::{BuildChunksOutput, ChunkingStats, ChunkingUseCase};
