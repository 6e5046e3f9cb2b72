//! Indexing pipeline orchestrator
//!
//! Stage layout:
//! 1. parse → IR → semantic IR: embarrassingly parallel per file (rayon),
//!    no shared mutable state
//! 2. graph build: one serial task consumes all per-file IR, then builds
//!    every index
//! 3. chunk build + IR/graph mapping
//! 4. chunk persistence: batched UPSERTs
//! 5. RepoMap build (bounded-concurrent LLM calls inside)
//! 6. index transformation
//!
//! Per-file parse failures become diagnostics and the file is skipped;
//! whole-run aborts happen only on fatal input, cancellation, or failed
//! snapshot persistence. Cancellation is checked between stages and no
//! partial snapshot is written after it fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::errors::{AtlasError, Result};
use crate::features::chunking::application::ChunkingUseCase;
use crate::features::chunking::domain::Chunk;
use crate::features::chunking::infrastructure::{
    ChunkBuilderConfig, ChunkGraphMapperConfig, ChunkIncrementalRefresher, FileInput, RefreshHooks,
};
use crate::features::chunking::ports::ChunkStore;
use crate::features::git_history::domain::FileStats;
use crate::features::graph_builder::infrastructure::GraphBuilder;
use crate::features::indexing::infrastructure::IndexTransformer;
use crate::features::indexing::domain::IndexDocument;
use crate::features::repomap::application::{RepoMapBuildInput, RepoMapBuilder};
use crate::features::repomap::domain::RepoMapBuildConfig;
use crate::features::repomap::ports::RepoMapStore;
use crate::pipeline::result::{IndexingResult, Stage, StageError};
use crate::shared::ports::{LlmPort, ParsedFile, ParserPort, SourceFile};

/// Caller-provided cancellation signal
///
/// Once cancelled, in-flight work finishes but no new stage starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunking: ChunkBuilderConfig,
    pub mapper: ChunkGraphMapperConfig,
    pub repomap: RepoMapBuildConfig,
    /// Rows per storage UPSERT batch
    pub storage_batch_size: usize,
    /// Workers for the per-file parse stage; one per CPU by default
    pub parse_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkBuilderConfig::default(),
            mapper: ChunkGraphMapperConfig::default(),
            repomap: RepoMapBuildConfig::default(),
            storage_batch_size: 500,
            parse_workers: num_cpus::get(),
        }
    }
}

/// Output of one pipeline run
pub struct PipelineOutput {
    pub result: IndexingResult,
    pub documents: Vec<IndexDocument>,
}

/// Intermediate artifacts shared by the full and refresh paths
struct BuildArtifacts {
    graph: crate::features::graph_builder::domain::GraphDocument,
    chunks: crate::features::chunking::application::chunking_usecase::BuildChunksOutput,
}

pub struct IndexingPipeline {
    parser: Arc<dyn ParserPort>,
    chunk_store: Arc<dyn ChunkStore>,
    repomap_store: Arc<dyn RepoMapStore>,
    llm: Option<Arc<dyn LlmPort>>,
    config: PipelineConfig,
}

impl IndexingPipeline {
    pub fn new(
        parser: Arc<dyn ParserPort>,
        chunk_store: Arc<dyn ChunkStore>,
        repomap_store: Arc<dyn RepoMapStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            parser,
            chunk_store,
            repomap_store,
            llm: None,
            config,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmPort>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Index a snapshot from scratch
    pub async fn index_snapshot(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        sources: &[SourceFile],
        file_stats: Option<&std::collections::HashMap<String, FileStats>>,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput> {
        let (artifacts, mut result) = self
            .build_artifacts(repo_id, snapshot_id, sources, cancel)
            .await?;

        // RepoMap snapshot (full build)
        let repomap = self
            .repomap_builder()
            .build(RepoMapBuildInput {
                repo_id,
                snapshot_id,
                chunks: &artifacts.chunks.chunks,
                chunk_to_graph: &artifacts.chunks.chunk_to_graph,
                graph: Some(&artifacts.graph),
                file_stats,
            })
            .await;
        let repomap = match repomap {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "repomap build failed");
                result
                    .errors
                    .push(StageError::new(Stage::RepoMap, e.to_string()));
                None
            }
        };

        let documents = IndexTransformer::transform(
            &artifacts.chunks.chunks,
            &artifacts.chunks.chunk_to_graph,
            Some(&artifacts.graph),
            repomap.as_ref(),
        );
        result.chunks_indexed = documents.len();

        info!(
            files = result.files_processed,
            chunks = result.chunks_created,
            indexed = result.chunks_indexed,
            errors = result.errors.len(),
            "indexing run complete"
        );

        Ok(PipelineOutput { result, documents })
    }

    /// Apply a change set against a previous snapshot
    ///
    /// Builds fresh chunks for the new snapshot, classifies them against
    /// the previous snapshot's stored chunks, persists the refresh result
    /// and updates the RepoMap incrementally.
    pub async fn refresh_snapshot(
        &self,
        repo_id: &str,
        prev_snapshot_id: &str,
        new_snapshot_id: &str,
        sources: &[SourceFile],
        file_stats: Option<&std::collections::HashMap<String, FileStats>>,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput> {
        let previous: Vec<Chunk> = self
            .chunk_store
            .find_chunks_by_repo(repo_id, Some(prev_snapshot_id))
            .await?
            .into_iter()
            .filter(|c| !c.is_deleted)
            .collect();

        let (artifacts, mut result) = self
            .build_artifacts(repo_id, new_snapshot_id, sources, cancel)
            .await?;

        // Classify against the previous snapshot and persist the outcome
        let refresher = ChunkIncrementalRefresher::new(
            self.config.repomap.span_drift_threshold,
            RefreshHooks::default(),
        );
        let refresh = refresher.refresh(&previous, &artifacts.chunks.chunks, new_snapshot_id);
        refresher
            .persist(self.chunk_store.as_ref(), &refresh)
            .await?;
        self.check_cancelled(cancel)?;

        // Incremental RepoMap update
        let repomap = self
            .repomap_builder()
            .update(
                RepoMapBuildInput {
                    repo_id,
                    snapshot_id: new_snapshot_id,
                    chunks: &artifacts.chunks.chunks,
                    chunk_to_graph: &artifacts.chunks.chunk_to_graph,
                    graph: Some(&artifacts.graph),
                    file_stats,
                },
                prev_snapshot_id,
                &refresh,
            )
            .await;
        let repomap = match repomap {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "incremental repomap update failed");
                result
                    .errors
                    .push(StageError::new(Stage::RepoMap, e.to_string()));
                None
            }
        };

        let documents = IndexTransformer::transform(
            &artifacts.chunks.chunks,
            &artifacts.chunks.chunk_to_graph,
            Some(&artifacts.graph),
            repomap.as_ref(),
        );
        result.chunks_indexed = documents.len();

        Ok(PipelineOutput { result, documents })
    }

    /// Stages 1-6: parse, graph build, chunking, chunk persistence
    async fn build_artifacts(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        sources: &[SourceFile],
        cancel: &CancellationToken,
    ) -> Result<(BuildArtifacts, IndexingResult)> {
        if repo_id.is_empty() || snapshot_id.is_empty() {
            return Err(AtlasError::fatal("repo_id and snapshot_id are required"));
        }

        let mut result = IndexingResult {
            repo_id: repo_id.to_string(),
            snapshot_id: snapshot_id.to_string(),
            ..Default::default()
        };

        // Stage 1-3: per-file parse → IR → semantic IR (parallel, CPU-bound)
        let parsed = self.parse_files(repo_id, snapshot_id, sources, &mut result);
        result.files_processed = parsed.len();
        self.check_cancelled(cancel)?;

        // Stage 4: serial graph merge + index construction
        let documents: Vec<_> = parsed
            .iter()
            .map(|p| (p.ir.clone(), p.semantic.clone()))
            .collect();
        let graph = GraphBuilder::new()
            .build(repo_id, snapshot_id, &documents)
            .map_err(|e| AtlasError::Graph(e.to_string()))?;
        self.check_cancelled(cancel)?;

        // Stage 5: chunk tree + mappings
        let file_texts: Vec<Vec<String>> = sources.iter().map(|s| s.lines()).collect();
        let file_inputs: Vec<FileInput<'_>> = parsed
            .iter()
            .filter_map(|p| {
                let idx = sources
                    .iter()
                    .position(|s| s.file_path == p.ir.file_path)?;
                Some(FileInput {
                    ir: &p.ir,
                    file_text: &file_texts[idx],
                })
            })
            .collect();

        let usecase = ChunkingUseCase::new(self.config.chunking.clone(), self.config.mapper.clone());
        let chunks = usecase.build_chunks(repo_id, snapshot_id, &file_inputs, Some(&graph));
        for err in &chunks.file_errors {
            result
                .errors
                .push(StageError::new(Stage::Chunking, err.to_string()));
        }
        result.chunks_created = chunks.chunks.len();
        self.check_cancelled(cancel)?;

        // Stage 6: persist chunks in batches
        self.persist_chunks(&chunks.chunks, &mut result).await?;
        self.check_cancelled(cancel)?;

        Ok((BuildArtifacts { graph, chunks }, result))
    }

    fn repomap_builder(&self) -> RepoMapBuilder {
        let mut builder =
            RepoMapBuilder::new(self.repomap_store.clone(), self.config.repomap.clone());
        if let Some(llm) = &self.llm {
            builder = builder.with_summarizer(llm.clone(), self.chunk_store.clone());
        }
        builder
    }

    fn parse_files(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        sources: &[SourceFile],
        result: &mut IndexingResult,
    ) -> Vec<ParsedFile> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parse_workers.max(1))
            .build();
        let outcomes: Vec<_> = match pool {
            Ok(pool) => pool.install(|| {
                sources
                    .par_iter()
                    .map(|source| self.parser.parse(repo_id, snapshot_id, source))
                    .collect()
            }),
            // Fall back to the global pool
            Err(_) => sources
                .par_iter()
                .map(|source| self.parser.parse(repo_id, snapshot_id, source))
                .collect(),
        };

        let mut parsed = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(file) => {
                    for diag in &file.diagnostics {
                        result.errors.push(StageError::for_file(
                            Stage::Parse,
                            diag.file_path.clone(),
                            diag.message.clone(),
                        ));
                    }
                    parsed.push(file);
                }
                Err(diag) => {
                    warn!(file = %diag.file_path, "parse failed, skipping file");
                    result.errors.push(StageError::for_file(
                        Stage::Parse,
                        diag.file_path,
                        diag.message,
                    ));
                }
            }
        }
        parsed
    }

    async fn persist_chunks(&self, chunks: &[Chunk], result: &mut IndexingResult) -> Result<()> {
        for batch in chunks.chunks(self.config.storage_batch_size.max(1)) {
            if let Err(e) = self.chunk_store.save_chunks(batch).await {
                result
                    .errors
                    .push(StageError::new(Stage::Persistence, e.to_string()));
                // Snapshot persistence is all-or-nothing; a failed batch
                // aborts the run so a retry starts clean.
                return Err(e);
            }
        }
        Ok(())
    }

    fn check_cancelled(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(AtlasError::Pipeline("cancelled by caller".to_string()));
        }
        Ok(())
    }
}
