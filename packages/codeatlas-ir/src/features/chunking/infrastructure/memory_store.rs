//! In-memory chunk store
//!
//! Backs tests and single-process runs; the production store lives behind
//! the same port in the storage package.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::errors::Result;
use crate::features::chunking::domain::{Chunk, ChunkKind};
use crate::features::chunking::ports::ChunkStore;

#[derive(Default)]
pub struct InMemoryChunkStore {
    chunks: RwLock<HashMap<String, Chunk>>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Priority tier for line lookup: function > class-like > file
    fn line_lookup_tier(kind: ChunkKind) -> Option<u8> {
        match kind {
            ChunkKind::Function => Some(0),
            k if k.is_class_like() => Some(1),
            ChunkKind::File => Some(2),
            _ => None,
        }
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn save_chunk(&self, chunk: &Chunk) -> Result<()> {
        self.chunks
            .write()
            .insert(chunk.chunk_id.clone(), chunk.clone());
        Ok(())
    }

    async fn save_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let mut map = self.chunks.write();
        for chunk in chunks {
            map.insert(chunk.chunk_id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn get_chunk(&self, chunk_id: &str) -> Result<Option<Chunk>> {
        Ok(self.chunks.read().get(chunk_id).cloned())
    }

    async fn get_chunks_batch(&self, chunk_ids: &[String]) -> Result<HashMap<String, Chunk>> {
        let map = self.chunks.read();
        Ok(chunk_ids
            .iter()
            .filter_map(|id| map.get(id).map(|c| (id.clone(), c.clone())))
            .collect())
    }

    async fn find_chunks_by_repo(
        &self,
        repo_id: &str,
        snapshot_id: Option<&str>,
    ) -> Result<Vec<Chunk>> {
        let map = self.chunks.read();
        let mut out: Vec<Chunk> = map
            .values()
            .filter(|c| c.repo_id == repo_id)
            .filter(|c| snapshot_id.map(|s| c.snapshot_id == s).unwrap_or(true))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id));
        Ok(out)
    }

    async fn get_chunks_by_file(
        &self,
        repo_id: &str,
        file_path: &str,
        commit: Option<&str>,
    ) -> Result<Vec<Chunk>> {
        let map = self.chunks.read();
        let mut out: Vec<Chunk> = map
            .values()
            .filter(|c| c.repo_id == repo_id && c.file_path.as_deref() == Some(file_path))
            .filter(|c| {
                commit
                    .map(|commit| c.last_indexed_commit.as_deref() == Some(commit))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id));
        Ok(out)
    }

    async fn find_chunk_by_file_and_line(
        &self,
        repo_id: &str,
        file_path: &str,
        line: u32,
    ) -> Result<Option<Chunk>> {
        let map = self.chunks.read();
        let best = map
            .values()
            .filter(|c| {
                !c.is_deleted
                    && c.repo_id == repo_id
                    && c.file_path.as_deref() == Some(file_path)
            })
            .filter_map(|c| {
                let tier = Self::line_lookup_tier(c.kind)?;
                let (start, end) = (c.start_line?, c.end_line?);
                (start <= line && line <= end).then(|| (tier, end - start, c))
            })
            // Priority tier first, then the smallest enclosing span
            .min_by_key(|(tier, width, _)| (*tier, *width))
            .map(|(_, _, c)| c.clone());
        Ok(best)
    }

    async fn find_file_chunk(&self, repo_id: &str, file_path: &str) -> Result<Option<Chunk>> {
        let map = self.chunks.read();
        Ok(map
            .values()
            .find(|c| {
                c.kind == ChunkKind::File
                    && c.repo_id == repo_id
                    && c.file_path.as_deref() == Some(file_path)
                    && !c.is_deleted
            })
            .cloned())
    }

    async fn delete_chunks_by_repo(&self, repo_id: &str, snapshot_id: &str) -> Result<()> {
        let mut map = self.chunks.write();
        for chunk in map.values_mut() {
            if chunk.repo_id == repo_id && chunk.snapshot_id == snapshot_id && !chunk.is_deleted {
                chunk.is_deleted = true;
                chunk.version += 1;
            }
        }
        Ok(())
    }
}
