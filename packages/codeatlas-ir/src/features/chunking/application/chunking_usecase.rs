//! Chunking UseCase
//!
//! Application-layer entry point: builds the chunk tree and both mappings
//! in one call.
//!
//! ```text
//! Pipeline
//!    ↓
//! ChunkingUseCase (this module)
//!    ↓
//! ChunkBuilder / ChunkMapper (infrastructure)
//!    ↓
//! Chunk (domain)
//! ```

use crate::features::chunking::domain::{Chunk, ChunkKind, ChunkToGraph, ChunkToIr};
use crate::features::chunking::infrastructure::{
    ChunkBuilder, ChunkBuilderConfig, ChunkGraphMapper, ChunkGraphMapperConfig, ChunkMapper,
    ChunkingError, FileInput, GraphNodeFilter,
};
use crate::features::graph_builder::domain::GraphDocument;

/// Output from building chunks
#[derive(Debug)]
pub struct BuildChunksOutput {
    pub chunks: Vec<Chunk>,
    pub chunk_to_ir: ChunkToIr,
    pub chunk_to_graph: ChunkToGraph,
    /// Class chunks flagged for downstream flattening
    pub large_classes: Vec<String>,
    /// Files whose chunks were discarded
    pub file_errors: Vec<ChunkingError>,
    pub stats: ChunkingStats,
}

/// Chunking statistics
#[derive(Debug, Clone, Default)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub module_chunks: usize,
    pub file_chunks: usize,
    pub class_chunks: usize,
    pub function_chunks: usize,
    pub role_chunks: usize,
}

impl ChunkingStats {
    fn from_chunks(chunks: &[Chunk]) -> Self {
        let mut stats = Self {
            total_chunks: chunks.len(),
            ..Default::default()
        };
        for chunk in chunks {
            match chunk.kind {
                ChunkKind::Module => stats.module_chunks += 1,
                ChunkKind::File => stats.file_chunks += 1,
                ChunkKind::Class => stats.class_chunks += 1,
                ChunkKind::Function => stats.function_chunks += 1,
                k if k.is_class_like() => stats.role_chunks += 1,
                _ => {}
            }
        }
        stats
    }
}

pub struct ChunkingUseCase {
    builder_config: ChunkBuilderConfig,
    mapper_config: ChunkGraphMapperConfig,
}

impl ChunkingUseCase {
    pub fn new(builder_config: ChunkBuilderConfig, mapper_config: ChunkGraphMapperConfig) -> Self {
        Self {
            builder_config,
            mapper_config,
        }
    }

    /// Build the chunk tree plus chunk→IR and chunk→graph mappings for one
    /// snapshot
    pub fn build_chunks(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        files: &[FileInput<'_>],
        graph: Option<&GraphDocument>,
    ) -> BuildChunksOutput {
        let mut builder = ChunkBuilder::new(self.builder_config.clone());
        let build = builder.build_snapshot(repo_id, snapshot_id, files, graph);

        let ir_docs: Vec<_> = files.iter().map(|f| f.ir).collect();
        let chunk_to_ir = ChunkMapper::map_ir(&build.chunks, &ir_docs);

        let chunk_to_graph = match graph {
            Some(graph) => {
                let mapper =
                    ChunkGraphMapper::new(GraphNodeFilter::default(), self.mapper_config.clone());
                mapper.map_graph(&build.chunks, graph)
            }
            None => Default::default(),
        };

        let stats = ChunkingStats::from_chunks(&build.chunks);

        BuildChunksOutput {
            chunks: build.chunks,
            chunk_to_ir,
            chunk_to_graph,
            large_classes: build.large_classes,
            file_errors: build.file_errors,
            stats,
        }
    }
}

impl Default for ChunkingUseCase {
    fn default() -> Self {
        Self::new(ChunkBuilderConfig::default(), ChunkGraphMapperConfig::default())
    }
}
