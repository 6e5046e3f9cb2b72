//! Incremental refresh integration tests
//!
//! Drives the refresher against the in-memory chunk store: unchanged
//! detection, move/drift accumulation across snapshots, soft deletion and
//! version bumps.

use codeatlas_ir::features::chunking::domain::{Chunk, ChunkKind};
use codeatlas_ir::features::chunking::infrastructure::{
    ChunkIncrementalRefresher, InMemoryChunkStore, RefreshHooks,
};
use codeatlas_ir::features::chunking::ports::ChunkStore;

fn function_chunk(fqn: &str, snapshot: &str, start: u32, end: u32, hash: &str) -> Chunk {
    let mut c = Chunk::new(
        format!("chunk:r:function:{}", fqn),
        "r".to_string(),
        snapshot.to_string(),
        ChunkKind::Function,
        fqn.to_string(),
    );
    c.file_path = Some("m.py".to_string());
    c.start_line = Some(start);
    c.end_line = Some(end);
    c.original_start_line = Some(start);
    c.original_end_line = Some(end);
    c.content_hash = Some(hash.to_string());
    c
}

#[tokio::test]
async fn test_move_then_drift_across_three_snapshots() {
    let refresher = ChunkIncrementalRefresher::new(10, RefreshHooks::default());
    let store = InMemoryChunkStore::new();

    // Snapshot 1: chunk at 10-20
    let s1 = vec![function_chunk("m.f", "s1", 10, 20, "H")];
    store.save_chunks(&s1).await.unwrap();

    // Snapshot 2: identical content at 15-25 → MOVED, original stays 10
    let s2 = vec![function_chunk("m.f", "s2", 15, 25, "H")];
    let r2 = refresher.refresh(&s1, &s2, "s2");
    assert_eq!(r2.updated.len(), 1);
    assert!(r2.drifted.is_empty());
    assert_eq!(r2.updated[0].original_start_line, Some(10));
    refresher.persist(&store, &r2).await.unwrap();

    // Snapshot 3: identical content at 25-35 → drift 15 > 10 → DRIFTED
    let s3 = vec![function_chunk("m.f", "s3", 25, 35, "H")];
    let r3 = refresher.refresh(&r2.updated, &s3, "s3");
    assert_eq!(r3.drifted.len(), 1);
    assert_eq!(r3.drifted[0].original_start_line, Some(10));
    assert_eq!(r3.drifted[0].version, 3);
}

#[tokio::test]
async fn test_empty_change_set_preserves_everything() {
    let refresher = ChunkIncrementalRefresher::default();

    let prev = vec![
        function_chunk("m.a", "s1", 1, 10, "HA"),
        function_chunk("m.b", "s1", 12, 20, "HB"),
    ];
    let curr = vec![
        function_chunk("m.a", "s2", 1, 10, "HA"),
        function_chunk("m.b", "s2", 12, 20, "HB"),
    ];

    let result = refresher.refresh(&prev, &curr, "s2");
    // Nothing changed: no version bumps anywhere
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_soft_delete_preserves_rows() {
    let store = InMemoryChunkStore::new();
    let chunks = vec![
        function_chunk("m.a", "s1", 1, 10, "HA"),
        function_chunk("m.b", "s1", 12, 20, "HB"),
    ];
    store.save_chunks(&chunks).await.unwrap();

    store.delete_chunks_by_repo("r", "s1").await.unwrap();

    // Every prior row remains, flagged and version-bumped
    let all = store.find_chunks_by_repo("r", None).await.unwrap();
    assert_eq!(all.len(), 2);
    for chunk in all {
        assert!(chunk.is_deleted);
        assert_eq!(chunk.version, 2);
    }
}

#[tokio::test]
async fn test_rename_emits_annotation_and_both_sides() {
    let refresher = ChunkIncrementalRefresher::default();

    let prev = vec![function_chunk("m.old_name", "s1", 5, 9, "H")];
    let curr = vec![function_chunk("m.new_name", "s2", 5, 9, "H")];

    let result = refresher.refresh(&prev, &curr, "s2");
    assert_eq!(result.renamed.len(), 1);
    assert_eq!(result.renamed[0].old_chunk_id, "chunk:r:function:m.old_name");
    assert_eq!(result.renamed[0].new_chunk_id, "chunk:r:function:m.new_name");
    assert_eq!(result.added.len(), 1);
    assert_eq!(result.deleted.len(), 1);
    assert!(result.deleted[0].is_deleted);

    let counts: std::collections::HashMap<_, _> = result.counts().into_iter().collect();
    assert_eq!(counts[&codeatlas_ir::features::chunking::domain::ChunkDiffKind::Added], 1);
    assert_eq!(counts[&codeatlas_ir::features::chunking::domain::ChunkDiffKind::Deleted], 1);
}

#[tokio::test]
async fn test_modified_bumps_version_and_commit() {
    let refresher = ChunkIncrementalRefresher::default();
    let store = InMemoryChunkStore::new();

    let prev = vec![function_chunk("m.f", "s1", 1, 10, "H1")];
    store.save_chunks(&prev).await.unwrap();

    let curr = vec![function_chunk("m.f", "s2", 1, 12, "H2")];
    let result = refresher.refresh(&prev, &curr, "commit-2");
    refresher.persist(&store, &result).await.unwrap();

    let row = store
        .get_chunk("chunk:r:function:m.f")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.version, 2);
    assert_eq!(row.last_indexed_commit.as_deref(), Some("commit-2"));
    assert_eq!(row.content_hash.as_deref(), Some("H2"));
}
