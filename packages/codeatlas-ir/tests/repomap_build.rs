//! RepoMap build integration tests
//!
//! Runs the build orchestrator against in-memory stores with a scripted
//! LLM, covering summary cache dedup by content hash, importance-ranked
//! queries and snapshot persistence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use codeatlas_ir::features::chunking::domain::{Chunk, ChunkKind};
use codeatlas_ir::features::chunking::infrastructure::InMemoryChunkStore;
use codeatlas_ir::features::chunking::ports::ChunkStore;
use codeatlas_ir::features::repomap::application::{RepoMapBuildInput, RepoMapBuilder};
use codeatlas_ir::features::repomap::domain::RepoMapBuildConfig;
use codeatlas_ir::features::repomap::infrastructure::summarizer::{
    CostController, InMemorySummaryCache, SummaryCache, SummaryCostConfig,
};
use codeatlas_ir::features::repomap::infrastructure::{InMemoryRepoMapStore, LlmSummarizer};
use codeatlas_ir::features::repomap::ports::RepoMapStore;
use codeatlas_ir::features::repomap::domain::{RepoMapKind, RepoMapNode};
use codeatlas_ir::shared::ports::llm::{LlmPort, LlmResult};

struct CountingLlm {
    calls: AtomicUsize,
}

impl CountingLlm {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmPort for CountingLlm {
    async fn generate(&self, _prompt: &str, _max: u32, _temp: f32) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Overview: Does a thing.\nDetails: Does a thing carefully. Twice.".to_string())
    }

    async fn embed(&self, _texts: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        Ok(vec![])
    }
}

fn chunk(id: &str, kind: ChunkKind, fqn: &str, file: &str, span: (u32, u32), hash: &str) -> Chunk {
    let mut c = Chunk::new(
        id.to_string(),
        "r".to_string(),
        "s1".to_string(),
        kind,
        fqn.to_string(),
    );
    c.file_path = Some(file.to_string());
    c.start_line = Some(span.0);
    c.end_line = Some(span.1);
    c.content_hash = Some(hash.to_string());
    c
}

fn repo_chunks() -> Vec<Chunk> {
    let mut repo = Chunk::new(
        "chunk:r:repo:r".to_string(),
        "r".to_string(),
        "s1".to_string(),
        ChunkKind::Repo,
        "r".to_string(),
    );
    repo.children = vec![
        "chunk:r:file:alpha.util".to_string(),
        "chunk:r:file:beta.util".to_string(),
    ];

    let mut file_a = chunk(
        "chunk:r:file:alpha.util",
        ChunkKind::File,
        "alpha.util",
        "alpha/util.py",
        (1, 40),
        "FA",
    );
    file_a.parent_id = Some(repo.chunk_id.clone());
    file_a.children = vec!["chunk:r:function:alpha.util.helper".to_string()];

    let mut file_b = chunk(
        "chunk:r:file:beta.util",
        ChunkKind::File,
        "beta.util",
        "beta/util.py",
        (1, 40),
        "FB",
    );
    file_b.parent_id = Some(repo.chunk_id.clone());
    file_b.children = vec!["chunk:r:function:beta.util.helper".to_string()];

    // Identical function bodies in two files share one content hash
    let mut fn_a = chunk(
        "chunk:r:function:alpha.util.helper",
        ChunkKind::Function,
        "alpha.util.helper",
        "alpha/util.py",
        (1, 30),
        "SHARED",
    );
    fn_a.parent_id = Some(file_a.chunk_id.clone());
    let mut fn_b = chunk(
        "chunk:r:function:beta.util.helper",
        ChunkKind::Function,
        "beta.util.helper",
        "beta/util.py",
        (1, 30),
        "SHARED",
    );
    fn_b.parent_id = Some(file_b.chunk_id.clone());

    vec![repo, file_a, file_b, fn_a, fn_b]
}

#[tokio::test]
async fn test_summary_cache_hit_by_content_hash() {
    // Scenario: two chunks with identical content; summarizing the first
    // primes the cache, the second never reaches the LLM.
    let llm = Arc::new(CountingLlm::new());
    let cache = Arc::new(InMemorySummaryCache::new());
    let cost = Arc::new(CostController::new(SummaryCostConfig {
        min_importance_threshold: 0.0,
        ..Default::default()
    }));
    let chunk_store = Arc::new(InMemoryChunkStore::new());
    chunk_store.save_chunks(&repo_chunks()).await.unwrap();

    let summarizer = LlmSummarizer::new(llm.clone(), cache.clone(), cost, chunk_store);

    let mut node_a = RepoMapNode::new("n:a", "r", "s1", RepoMapKind::Function, "helper");
    node_a.chunk_ids = vec!["chunk:r:function:alpha.util.helper".to_string()];
    node_a.metrics.importance = 0.9;
    let mut node_b = RepoMapNode::new("n:b", "r", "s1", RepoMapKind::Function, "helper");
    node_b.chunk_ids = vec!["chunk:r:function:beta.util.helper".to_string()];
    node_b.metrics.importance = 0.9;

    let first = summarizer.summarize_leaf(&node_a).await;
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);

    let second = summarizer.summarize_leaf(&node_b).await;
    // Cache hit reuses the prior summary exactly, without an LLM call
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_build_persists_snapshot_with_summaries() {
    let store = Arc::new(InMemoryRepoMapStore::new());
    let chunk_store = Arc::new(InMemoryChunkStore::new());
    chunk_store.save_chunks(&repo_chunks()).await.unwrap();
    let llm = Arc::new(CountingLlm::new());

    let config = RepoMapBuildConfig {
        summary_enabled: true,
        pagerank_enabled: false,
        min_loc: 0,
        ..Default::default()
    };
    let builder = RepoMapBuilder::new(store.clone(), config)
        .with_summarizer(llm.clone(), chunk_store.clone());

    let snapshot = builder
        .build(RepoMapBuildInput {
            repo_id: "r",
            snapshot_id: "s1",
            chunks: &repo_chunks(),
            chunk_to_graph: &HashMap::new(),
            graph: None,
            file_stats: None,
        })
        .await
        .unwrap();

    assert!(snapshot.validate_depths().is_ok());
    // Hierarchical mode summarizes every node
    assert!(snapshot.nodes.iter().all(|n| n.summary.is_some()));
    // The snapshot round-trips through the store
    let loaded = store.get_snapshot("r", "s1").unwrap().unwrap();
    assert_eq!(loaded, snapshot);
}

#[tokio::test]
async fn test_topk_by_importance() {
    let store = Arc::new(InMemoryRepoMapStore::new());
    let config = RepoMapBuildConfig {
        min_loc: 0,
        ..Default::default()
    };
    let builder = RepoMapBuilder::new(store.clone(), config);

    builder
        .build(RepoMapBuildInput {
            repo_id: "r",
            snapshot_id: "s1",
            chunks: &repo_chunks(),
            chunk_to_graph: &HashMap::new(),
            graph: None,
            file_stats: None,
        })
        .await
        .unwrap();

    let top = store.get_topk_by_importance("r", "s1", 3).unwrap();
    assert_eq!(top.len(), 3);
    // Descending importance
    for pair in top.windows(2) {
        assert!(pair[0].metrics.importance >= pair[1].metrics.importance);
    }
}
