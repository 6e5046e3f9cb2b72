//! Chunk Incremental Refresher
//!
//! Compares a previous snapshot's chunks with a freshly built chunk set and
//! classifies every chunk as unchanged / moved / drifted / modified / added
//! / deleted, with rename detection. Unchanged chunks carry over untouched;
//! everything else gets a version bump and the new commit id.
//!
//! Verdict table, keyed by `(file_path, fqn, kind)`:
//!
//! | prev vs new hash | prev vs new span            | drift > threshold | verdict      |
//! |------------------|-----------------------------|-------------------|--------------|
//! | equal            | equal                       | n/a               | UNCHANGED    |
//! | equal            | different                   | no                | MOVED        |
//! | equal            | different (from *original*) | yes               | MOVED+DRIFT  |
//! | different        | any                         | n/a               | MODIFIED     |
//!
//! Drift is measured against the original span recorded at first index, so
//! repeated small moves accumulate. Drift alone never means modified; it
//! signals stale summaries/importance.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::features::chunking::domain::{Chunk, ChunkKind, ChunkRefreshResult, RenamedChunk};
use crate::features::chunking::ports::ChunkStore;
use crate::errors::Result;

/// Default span drift threshold in lines
pub const SPAN_DRIFT_THRESHOLD: u32 = 10;

/// Optional callbacks used to invalidate downstream caches without blocking
/// the refresh itself
#[derive(Default)]
pub struct RefreshHooks {
    pub on_chunk_drifted: Option<Box<dyn Fn(&Chunk) + Send + Sync>>,
    /// `(old_id, new_id, chunk)`
    pub on_chunk_renamed: Option<Box<dyn Fn(&str, &str, &Chunk) + Send + Sync>>,
    pub on_chunk_modified: Option<Box<dyn Fn(&Chunk) + Send + Sync>>,
}

pub struct ChunkIncrementalRefresher {
    span_drift_threshold: u32,
    hooks: RefreshHooks,
}

type ChunkKey = (Option<String>, String, ChunkKind);

fn key_of(chunk: &Chunk) -> ChunkKey {
    (chunk.file_path.clone(), chunk.fqn.clone(), chunk.kind)
}

impl ChunkIncrementalRefresher {
    pub fn new(span_drift_threshold: u32, hooks: RefreshHooks) -> Self {
        Self {
            span_drift_threshold,
            hooks,
        }
    }

    /// Compare and classify
    ///
    /// `previous` is the prior snapshot's non-deleted chunks, `current` the
    /// freshly built chunk set for the new snapshot. `new_commit` lands in
    /// `last_indexed_commit` of every changed chunk.
    pub fn refresh(
        &self,
        previous: &[Chunk],
        current: &[Chunk],
        new_commit: &str,
    ) -> ChunkRefreshResult {
        let mut result = ChunkRefreshResult::default();

        let prev_by_key: HashMap<ChunkKey, &Chunk> = previous
            .iter()
            .filter(|c| !c.is_deleted)
            .map(|c| (key_of(c), c))
            .collect();
        let curr_by_key: HashMap<ChunkKey, &Chunk> =
            current.iter().map(|c| (key_of(c), c)).collect();

        // Matched pairs and additions
        let mut added_candidates: Vec<&Chunk> = Vec::new();
        for chunk in current {
            let key = key_of(chunk);
            match prev_by_key.get(&key) {
                Some(prev) => {
                    self.classify_pair(prev, chunk, new_commit, &mut result);
                }
                None => added_candidates.push(chunk),
            }
        }

        // Deletions, with rename detection against the added set
        let mut deleted_candidates: Vec<&Chunk> = previous
            .iter()
            .filter(|c| !c.is_deleted && !curr_by_key.contains_key(&key_of(c)))
            .collect();

        let mut renamed_new_ids: Vec<String> = Vec::new();
        for old in &deleted_candidates {
            let Some(old_hash) = &old.content_hash else {
                continue;
            };
            // Rename: unchanged content, changed FQN, unchanged file path
            let renamed_to = added_candidates.iter().find(|new| {
                new.content_hash.as_ref() == Some(old_hash)
                    && new.file_path == old.file_path
                    && new.fqn != old.fqn
                    && !renamed_new_ids.contains(&new.chunk_id)
            });
            if let Some(new) = renamed_to {
                renamed_new_ids.push(new.chunk_id.clone());
                result.renamed.push(RenamedChunk {
                    old_chunk_id: old.chunk_id.clone(),
                    new_chunk_id: new.chunk_id.clone(),
                    old_fqn: old.fqn.clone(),
                    new_fqn: new.fqn.clone(),
                });
                if let Some(hook) = &self.hooks.on_chunk_renamed {
                    hook(&old.chunk_id, &new.chunk_id, new);
                }
            }
        }

        // Added chunks (renames included, annotated above)
        for chunk in added_candidates {
            let mut added = chunk.clone();
            added.version = 1;
            added.last_indexed_commit = Some(new_commit.to_string());
            result.added.push(added);
        }

        // Deleted chunks are soft-deleted with a version bump
        for old in deleted_candidates.drain(..) {
            let mut deleted = old.clone();
            deleted.is_deleted = true;
            deleted.version = old.version + 1;
            deleted.last_indexed_commit = Some(new_commit.to_string());
            result.deleted.push(deleted);
        }

        info!(
            added = result.added.len(),
            updated = result.updated.len(),
            deleted = result.deleted.len(),
            renamed = result.renamed.len(),
            drifted = result.drifted.len(),
            "chunk refresh classified"
        );

        result
    }

    fn classify_pair(
        &self,
        prev: &Chunk,
        curr: &Chunk,
        new_commit: &str,
        result: &mut ChunkRefreshResult,
    ) {
        // Option equality: structural chunks without hashes compare equal
        // when both sides are hashless, so they never churn.
        let hash_equal = prev.content_hash == curr.content_hash;
        let span_equal = prev.start_line == curr.start_line && prev.end_line == curr.end_line;

        if hash_equal && span_equal {
            return; // UNCHANGED: carried over by reference
        }

        // Same logical chunk: the original span survives from the previous
        // snapshot so drift accumulates across refreshes.
        let mut updated = curr.clone();
        updated.original_start_line = prev.original_start_line.or(prev.start_line);
        updated.original_end_line = prev.original_end_line.or(prev.end_line);
        updated.version = prev.version + 1;
        updated.last_indexed_commit = Some(new_commit.to_string());

        if hash_equal {
            // MOVED; drifted when the move from the original span exceeds
            // the threshold
            let drift = updated.span_drift();
            if drift > self.span_drift_threshold {
                debug!(chunk = %updated.chunk_id, drift, "chunk drifted");
                if let Some(hook) = &self.hooks.on_chunk_drifted {
                    hook(&updated);
                }
                result.drifted.push(updated.clone());
            }
            result.updated.push(updated);
        } else {
            // MODIFIED
            if let Some(hook) = &self.hooks.on_chunk_modified {
                hook(&updated);
            }
            result.updated.push(updated);
        }
    }

    /// Persist a refresh result through the chunk store
    ///
    /// Added, updated and soft-deleted rows all go through the batch
    /// UPSERT; rows keep their history via the version counter.
    pub async fn persist(
        &self,
        store: &dyn ChunkStore,
        result: &ChunkRefreshResult,
    ) -> Result<()> {
        let mut batch: Vec<Chunk> = Vec::with_capacity(result.total_changes());
        batch.extend(result.added.iter().cloned());
        batch.extend(result.updated.iter().cloned());
        batch.extend(result.deleted.iter().cloned());
        if !batch.is_empty() {
            store.save_chunks(&batch).await?;
        }
        Ok(())
    }
}

impl Default for ChunkIncrementalRefresher {
    fn default() -> Self {
        Self::new(SPAN_DRIFT_THRESHOLD, RefreshHooks::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn chunk(fqn: &str, file: &str, start: u32, end: u32, hash: &str) -> Chunk {
        let mut c = Chunk::new(
            format!("chunk:r:function:{}", fqn),
            "r".to_string(),
            "s1".to_string(),
            ChunkKind::Function,
            fqn.to_string(),
        );
        c.file_path = Some(file.to_string());
        c.start_line = Some(start);
        c.end_line = Some(end);
        c.original_start_line = Some(start);
        c.original_end_line = Some(end);
        c.content_hash = Some(hash.to_string());
        c
    }

    #[test]
    fn test_empty_change_set_yields_no_changes() {
        let refresher = ChunkIncrementalRefresher::default();
        let prev = vec![chunk("m.f", "m.py", 10, 20, "H")];
        let curr = vec![chunk("m.f", "m.py", 10, 20, "H")];

        let result = refresher.refresh(&prev, &curr, "c2");
        assert!(result.is_empty());
    }

    #[test]
    fn test_moved_below_threshold() {
        let refresher = ChunkIncrementalRefresher::default();
        let prev = vec![chunk("m.f", "m.py", 10, 20, "H")];
        let curr = vec![chunk("m.f", "m.py", 15, 25, "H")];

        let result = refresher.refresh(&prev, &curr, "c2");
        assert_eq!(result.updated.len(), 1);
        assert!(result.drifted.is_empty());

        let moved = &result.updated[0];
        assert_eq!(moved.original_start_line, Some(10));
        assert_eq!(moved.version, 2);
        assert_eq!(moved.last_indexed_commit.as_deref(), Some("c2"));
    }

    #[test]
    fn test_drift_accumulates_from_original_span() {
        let drift_count = Arc::new(AtomicUsize::new(0));
        let counter = drift_count.clone();
        let hooks = RefreshHooks {
            on_chunk_drifted: Some(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        let refresher = ChunkIncrementalRefresher::new(10, hooks);

        // Snapshot 2: moved to 15-25 (drift 5, below threshold)
        let prev = vec![chunk("m.f", "m.py", 10, 20, "H")];
        let curr = vec![chunk("m.f", "m.py", 15, 25, "H")];
        let r2 = refresher.refresh(&prev, &curr, "c2");
        assert!(r2.drifted.is_empty());

        // Snapshot 3: moved to 25-35; drift from original = 15 > 10
        let prev3 = r2.updated;
        let curr3 = vec![chunk("m.f", "m.py", 25, 35, "H")];
        let r3 = refresher.refresh(&prev3, &curr3, "c3");
        assert_eq!(r3.drifted.len(), 1);
        assert_eq!(r3.drifted[0].original_start_line, Some(10));
        assert_eq!(drift_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drift_exactly_at_threshold_is_not_drifted() {
        let refresher = ChunkIncrementalRefresher::new(10, RefreshHooks::default());
        let prev = vec![chunk("m.f", "m.py", 10, 20, "H")];
        let curr = vec![chunk("m.f", "m.py", 20, 30, "H")]; // drift = 10

        let result = refresher.refresh(&prev, &curr, "c2");
        assert!(result.drifted.is_empty());

        let curr2 = vec![chunk("m.f", "m.py", 21, 31, "H")]; // drift = 11
        let result2 = refresher.refresh(&prev, &curr2, "c2");
        assert_eq!(result2.drifted.len(), 1);
    }

    #[test]
    fn test_modified_chunk() {
        let refresher = ChunkIncrementalRefresher::default();
        let prev = vec![chunk("m.f", "m.py", 10, 20, "H1")];
        let curr = vec![chunk("m.f", "m.py", 10, 22, "H2")];

        let result = refresher.refresh(&prev, &curr, "c2");
        assert_eq!(result.updated.len(), 1);
        assert_eq!(result.updated[0].version, 2);
        assert!(result.drifted.is_empty());
    }

    #[test]
    fn test_added_and_deleted() {
        let refresher = ChunkIncrementalRefresher::default();
        let prev = vec![chunk("m.old", "m.py", 1, 5, "H1")];
        let curr = vec![chunk("m.new", "m.py", 1, 5, "H2")];

        let result = refresher.refresh(&prev, &curr, "c2");
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].version, 1);
        assert_eq!(result.deleted.len(), 1);
        assert!(result.deleted[0].is_deleted);
        assert_eq!(result.deleted[0].version, 2);
        // Different hashes: not a rename
        assert!(result.renamed.is_empty());
    }

    #[test]
    fn test_rename_detection() {
        let renames = Arc::new(AtomicUsize::new(0));
        let counter = renames.clone();
        let hooks = RefreshHooks {
            on_chunk_renamed: Some(Box::new(move |old_id, new_id, _| {
                assert_ne!(old_id, new_id);
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        let refresher = ChunkIncrementalRefresher::new(10, hooks);

        // Same content hash, same file, different FQN
        let prev = vec![chunk("m.old_name", "m.py", 1, 5, "H")];
        let curr = vec![chunk("m.new_name", "m.py", 1, 5, "H")];

        let result = refresher.refresh(&prev, &curr, "c2");
        assert_eq!(result.renamed.len(), 1);
        assert_eq!(result.renamed[0].old_fqn, "m.old_name");
        assert_eq!(result.renamed[0].new_fqn, "m.new_name");
        // Rename still shows up as deleted + added
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.deleted.len(), 1);
        assert_eq!(renames.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_moved_file_is_not_a_rename() {
        let refresher = ChunkIncrementalRefresher::default();
        let prev = vec![chunk("a.f", "a.py", 1, 5, "H")];
        let curr = vec![chunk("b.f", "b.py", 1, 5, "H")];

        let result = refresher.refresh(&prev, &curr, "c2");
        assert!(result.renamed.is_empty());
    }
}
