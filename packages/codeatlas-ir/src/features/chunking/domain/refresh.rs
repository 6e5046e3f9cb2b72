//! Incremental refresh result types

use serde::{Deserialize, Serialize};

use super::Chunk;

/// Verdict for one chunk compared across two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkDiffKind {
    Unchanged,
    /// Content identical, span shifted within the drift threshold
    Moved,
    /// Content identical, span shifted past the drift threshold measured
    /// from the original span
    Drifted,
    Modified,
    Added,
    Deleted,
}

/// Rename annotation: content unchanged, FQN changed, file path unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenamedChunk {
    pub old_chunk_id: String,
    pub new_chunk_id: String,
    pub old_fqn: String,
    pub new_fqn: String,
}

/// Result of one incremental refresh
///
/// Each chunk in `updated` carries its bumped version and the new
/// `last_indexed_commit`; `deleted` chunks are soft-deleted rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkRefreshResult {
    pub added: Vec<Chunk>,
    pub updated: Vec<Chunk>,
    pub deleted: Vec<Chunk>,
    pub renamed: Vec<RenamedChunk>,
    /// Chunks that moved past the drift threshold; cached summaries and
    /// importance may be stale even though content is identical
    pub drifted: Vec<Chunk>,
}

impl ChunkRefreshResult {
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.updated.len() + self.deleted.len()
    }

    /// Per-verdict counts, for logging and result reporting
    pub fn counts(&self) -> Vec<(ChunkDiffKind, usize)> {
        vec![
            (ChunkDiffKind::Added, self.added.len()),
            (ChunkDiffKind::Modified, self.updated.len()),
            (ChunkDiffKind::Deleted, self.deleted.len()),
            (ChunkDiffKind::Drifted, self.drifted.len()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0 && self.renamed.is_empty() && self.drifted.is_empty()
    }

    /// File paths touched by this refresh
    pub fn affected_files(&self) -> std::collections::HashSet<String> {
        self.added
            .iter()
            .chain(self.updated.iter())
            .chain(self.deleted.iter())
            .filter_map(|c| c.file_path.clone())
            .collect()
    }
}
