/*
 * codeatlas-ir - Code Intelligence Indexing Core
 *
 * Feature-First Layout:
 * - shared/      : Common models (IR, graph kinds, Span), ports, utilities
 * - features/    : Vertical slices (graph_builder, chunking, repomap,
 *                  git_history, indexing)
 * - pipeline/    : Orchestration (per-file parallel parse, serial graph
 *                  merge, chunking, repomap, index transformation)
 *
 * Converts a source repository at a given revision into a multi-layer,
 * queryable representation for RAG over code: a chunk tree with stable
 * ids and incremental refresh, a unified code graph with precomputed
 * indexes, and a ranked RepoMap with optional LLM summaries.
 */

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

/// Shared models, ports and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Pipeline orchestration
pub mod pipeline;

/// Error types
pub mod errors;

// Re-exports for the public API
pub use errors::{AtlasError, Result};
pub use features::chunking::{Chunk, ChunkKind, ChunkStore};
pub use features::graph_builder::{GraphBuilder, GraphDocument, GraphEdge, GraphNode};
pub use features::indexing::{IndexDocument, IndexTransformer};
pub use features::repomap::{
    RepoMapBuildConfig, RepoMapBuilder, RepoMapNode, RepoMapSnapshot, RepoMapStore,
};
pub use pipeline::{CancellationToken, IndexingPipeline, IndexingResult, PipelineConfig};
pub use shared::models::{GraphEdgeKind, GraphNodeKind, IrDocument, IrNode, Span};
pub use shared::ports::{LlmPort, ParserPort, SourceFile};
