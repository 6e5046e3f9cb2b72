//! Chunking feature
//!
//! Symbol-first hierarchical chunk builder with stable identifiers,
//! deduplicating content hashes, boundary invariants and an incremental
//! refresh protocol.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::ChunkingUseCase;
pub use domain::{Chunk, ChunkKind, ChunkRefreshResult};
pub use infrastructure::{ChunkBuilder, ChunkIncrementalRefresher};
pub use ports::ChunkStore;
