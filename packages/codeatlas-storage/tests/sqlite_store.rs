//! SQLite graph store integration tests

use ahash::AHashMap;
use pretty_assertions::assert_eq;

use codeatlas_ir::features::graph_builder::domain::{GraphDocument, GraphEdge, GraphNode};
use codeatlas_ir::shared::models::{GraphEdgeKind, GraphNodeKind, Span};
use codeatlas_storage::{GraphStore, SqliteGraphStore};

fn node(id: &str, kind: GraphNodeKind, repo: &str, snapshot: &str) -> GraphNode {
    GraphNode {
        id: id.to_string(),
        kind,
        repo_id: repo.to_string(),
        snapshot_id: Some(snapshot.to_string()),
        fqn: id.to_string(),
        name: id.rsplit(':').next().unwrap_or(id).to_string(),
        path: Some("src/main.py".to_string()),
        span: Some(Span::lines(1, 10)),
        attrs: AHashMap::new(),
    }
}

fn sample_graph() -> GraphDocument {
    let mut doc = GraphDocument::new("repo", "s1");
    for n in [
        node("f:main", GraphNodeKind::Function, "repo", "s1"),
        node("f:helper", GraphNodeKind::Function, "repo", "s1"),
        node("m:app", GraphNodeKind::Module, "repo", "s1"),
        node("v:x", GraphNodeKind::Variable, "repo", "s1"),
        node("b:1", GraphNodeKind::CfgBlock, "repo", "s1"),
        node("b:2", GraphNodeKind::CfgBlock, "repo", "s1"),
    ] {
        doc.graph_nodes.insert(n.id.clone(), n);
    }
    doc.graph_edges = vec![
        GraphEdge::new("e1", GraphEdgeKind::Calls, "f:main", "f:helper"),
        GraphEdge::new("e2", GraphEdgeKind::Imports, "f:main", "m:app"),
        GraphEdge::new("e3", GraphEdgeKind::Contains, "m:app", "f:helper"),
        GraphEdge::new("e4", GraphEdgeKind::Reads, "b:1", "v:x"),
        GraphEdge::new("e5", GraphEdgeKind::Writes, "b:2", "v:x"),
        GraphEdge::new("e6", GraphEdgeKind::CfgBranch, "b:1", "b:2"),
    ];
    doc
}

#[tokio::test]
async fn test_save_and_query_roundtrip() {
    let store = SqliteGraphStore::open_in_memory().unwrap();
    store.save_graph(&sample_graph()).await.unwrap();

    let loaded = store.query_node_by_id("f:main").await.unwrap().unwrap();
    assert_eq!(loaded.kind, GraphNodeKind::Function);
    assert_eq!(loaded.span, Some(Span::lines(1, 10)));

    assert!(store.query_node_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_relationship_queries() {
    let store = SqliteGraphStore::open_in_memory().unwrap();
    store.save_graph(&sample_graph()).await.unwrap();

    let callers = store.query_called_by("f:helper").await.unwrap();
    assert_eq!(callers.len(), 1);
    assert_eq!(callers[0].id, "f:main");

    let importers = store.query_imported_by("m:app").await.unwrap();
    assert_eq!(importers.len(), 1);

    let children = store.query_contains_children("m:app").await.unwrap();
    assert_eq!(children[0].id, "f:helper");

    let readers = store.query_reads_variable("v:x").await.unwrap();
    assert_eq!(readers[0].id, "b:1");
    let writers = store.query_writes_variable("v:x").await.unwrap();
    assert_eq!(writers[0].id, "b:2");

    let successors = store.query_cfg_successors("b:1").await.unwrap();
    assert_eq!(successors.len(), 1);
    assert_eq!(successors[0].id, "b:2");
}

#[tokio::test]
async fn test_save_is_idempotent_upsert() {
    let store = SqliteGraphStore::open_in_memory().unwrap();
    let doc = sample_graph();
    store.save_graph(&doc).await.unwrap();
    // Second save with the same keys must not error or duplicate
    store.save_graph(&doc).await.unwrap();

    let callers = store.query_called_by("f:helper").await.unwrap();
    assert_eq!(callers.len(), 1);
}

#[tokio::test]
async fn test_delete_nodes_cascades_edges() {
    let store = SqliteGraphStore::open_in_memory().unwrap();
    store.save_graph(&sample_graph()).await.unwrap();

    let deleted = store.delete_nodes(&["f:helper".to_string()]).await.unwrap();
    assert_eq!(deleted, 1);

    // Edges touching the node are gone
    assert!(store.query_called_by("f:helper").await.unwrap().is_empty());
    assert!(store
        .query_contains_children("m:app")
        .await
        .unwrap()
        .is_empty());
    // Unrelated edges survive
    assert_eq!(store.query_reads_variable("v:x").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_by_filter() {
    let store = SqliteGraphStore::open_in_memory().unwrap();
    let mut doc = sample_graph();
    // A second snapshot in the same repo
    let extra = node("f:other", GraphNodeKind::Function, "repo", "s2");
    doc.graph_nodes.insert(extra.id.clone(), extra);
    store.save_graph(&doc).await.unwrap();

    let deleted = store.delete_snapshot("repo", "s2").await.unwrap();
    assert_eq!(deleted, 1);
    assert!(store.query_node_by_id("f:other").await.unwrap().is_none());
    assert!(store.query_node_by_id("f:main").await.unwrap().is_some());

    // Kind-filtered delete removes the CFG blocks only
    let deleted = store
        .delete_nodes_by_filter("repo", Some("s1"), Some(GraphNodeKind::CfgBlock))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert!(store.query_node_by_id("b:1").await.unwrap().is_none());

    // Whole-repo delete leaves nothing behind
    store.delete_repo("repo").await.unwrap();
    assert!(store.query_node_by_id("f:main").await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_backed_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atlas.db");

    {
        let store = SqliteGraphStore::open(&path).unwrap();
        store.save_graph(&sample_graph()).await.unwrap();
    }

    // Reopen and read back
    let store = SqliteGraphStore::open(&path).unwrap();
    let node = store.query_node_by_id("f:main").await.unwrap();
    assert!(node.is_some());
}
