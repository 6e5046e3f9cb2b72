//! Chunk store port
//!
//! Batch UPSERTs are keyed by chunk id. Deletion is always soft: rows stay
//! for audit with `is_deleted` flipped and the version incremented.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::Result;
use crate::features::chunking::domain::Chunk;

#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn save_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Batch UPSERT keyed by chunk id
    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    async fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>>;

    async fn get_chunks_batch(&self, chunk_ids: &[String]) -> Result<HashMap<String, Chunk>>;

    /// All chunks of a repo, optionally narrowed to one snapshot
    async fn find_chunks_by_repo(
        &self,
        repo_id: &str,
        snapshot_id: Option<&str>,
    ) -> Result<Vec<Chunk>>;

    /// Chunks of one file, optionally at a specific commit
    async fn get_chunks_by_file(
        &self,
        repo_id: &str,
        file_path: &str,
        commit: Option<&str>,
    ) -> Result<Vec<Chunk>>;

    /// Smallest enclosing chunk for a line, preferring function/method over
    /// class over file
    async fn find_chunk_by_file_and_line(
        &self,
        repo_id: &str,
        file_path: &str,
        line: u32,
    ) -> Result<Option<Chunk>>;

    async fn find_file_chunk(&self, repo_id: &str, file_path: &str) -> Result<Option<Chunk>>;

    /// Soft-delete every chunk of a repo snapshot (version bump, rows kept)
    async fn delete_chunks_by_repo(&self, repo_id: &str, snapshot_id: &str) -> Result<()>;
}
