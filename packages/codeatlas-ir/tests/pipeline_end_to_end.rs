//! End-to-end pipeline tests
//!
//! A scripted parser stands in for the tree-sitter side; the pipeline runs
//! parse → graph → chunks → repomap → index documents against in-memory
//! stores.

use std::collections::HashMap;
use std::sync::Arc;

use codeatlas_ir::errors::AtlasError;
use codeatlas_ir::features::chunking::infrastructure::InMemoryChunkStore;
use codeatlas_ir::features::chunking::ports::ChunkStore;
use codeatlas_ir::features::repomap::infrastructure::InMemoryRepoMapStore;
use codeatlas_ir::features::repomap::ports::RepoMapStore;
use codeatlas_ir::pipeline::{CancellationToken, IndexingPipeline, PipelineConfig, Stage};
use codeatlas_ir::shared::models::{IrCall, IrDocument, IrNode, IrNodeKind, Span};
use codeatlas_ir::shared::ports::{ParseDiagnostic, ParsedFile, ParserPort, SourceFile};

/// Deterministic parser double: one file node plus one function per
/// `def `-prefixed line, calls resolved within the file
struct ScriptedParser;

impl ParserPort for ScriptedParser {
    fn parse(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        source: &SourceFile,
    ) -> Result<ParsedFile, ParseDiagnostic> {
        if source.content.contains("%%broken%%") {
            return Err(ParseDiagnostic {
                file_path: source.file_path.clone(),
                message: "syntax error".to_string(),
                line: Some(1),
            });
        }

        let module_fqn = source
            .file_path
            .trim_end_matches(".py")
            .replace(['/', '\\'], ".");
        let lines: Vec<&str> = source.content.lines().collect();

        let mut ir = IrDocument::new(repo_id, snapshot_id, &source.file_path, "python");
        ir.nodes.push(IrNode::new(
            format!("ir:file:{}", source.file_path),
            IrNodeKind::File,
            module_fqn.clone(),
            source.file_path.clone(),
            source.file_path.clone(),
            Span::lines(1, lines.len().max(1) as u32),
            "python",
        ));

        let mut defs: Vec<(String, u32)> = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if let Some(name) = line.strip_prefix("def ") {
                let name = name.split('(').next().unwrap_or(name).trim();
                defs.push((name.to_string(), i as u32 + 1));
            }
        }
        for (idx, (name, start)) in defs.iter().enumerate() {
            let end = defs
                .get(idx + 1)
                .map(|(_, next)| next - 1)
                .unwrap_or(lines.len() as u32);
            ir.nodes.push(IrNode::new(
                format!("ir:fn:{}:{}", source.file_path, name),
                IrNodeKind::Function,
                format!("{}.{}", module_fqn, name),
                name.clone(),
                source.file_path.clone(),
                Span::lines(*start, end),
                "python",
            ));
        }

        // A call per "calls:<name>" marker, resolved within this file
        for (i, line) in lines.iter().enumerate() {
            if let Some(callee) = line.trim().strip_prefix("# calls:") {
                let caller = defs
                    .iter()
                    .rev()
                    .find(|(_, start)| *start <= i as u32 + 1)
                    .map(|(name, _)| name.clone());
                if let Some(caller) = caller {
                    ir.calls.push(IrCall {
                        caller_id: format!("ir:fn:{}:{}", source.file_path, caller),
                        callee_name: callee.trim().to_string(),
                        resolved_callee_id: Some(format!(
                            "ir:fn:{}:{}",
                            source.file_path,
                            callee.trim()
                        )),
                        span: None,
                    });
                }
            }
        }

        Ok(ParsedFile {
            ir,
            semantic: None,
            diagnostics: Vec::new(),
        })
    }

    fn supported_languages(&self) -> &[&str] {
        &["python"]
    }
}

fn pipeline() -> (IndexingPipeline, Arc<InMemoryChunkStore>, Arc<InMemoryRepoMapStore>) {
    let chunk_store = Arc::new(InMemoryChunkStore::new());
    let repomap_store = Arc::new(InMemoryRepoMapStore::new());
    let pipeline = IndexingPipeline::new(
        Arc::new(ScriptedParser),
        chunk_store.clone(),
        repomap_store.clone(),
        PipelineConfig::default(),
    );
    (pipeline, chunk_store, repomap_store)
}

fn sources() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "app/main.py",
            "def main():\n    # calls:run\n    x = 1\n    y = 2\n    z = x + y\n    return z\ndef run():\n    a = 1\n    b = 2\n    return a + b",
            "python",
        ),
        SourceFile::new(
            "app/helpers.py",
            "def helper_one():\n    total = 0\n    for i in range(10):\n        total += i\n    return total\ndef helper_two():\n    values = []\n    for i in range(5):\n        values.append(i)\n    return values",
            "python",
        ),
    ]
}

#[tokio::test]
async fn test_full_indexing_run() {
    let (pipeline, chunk_store, repomap_store) = pipeline();

    let output = pipeline
        .index_snapshot("myrepo", "s1", &sources(), None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.result.files_processed, 2);
    assert!(output.result.chunks_created > 0);
    assert_eq!(output.result.chunks_indexed, output.documents.len());
    assert!(!output.result.has_errors());

    // Chunks persisted
    assert!(!chunk_store.is_empty());
    let file_chunk = chunk_store
        .find_file_chunk("myrepo", "app/main.py")
        .await
        .unwrap();
    assert!(file_chunk.is_some());

    // RepoMap snapshot saved with a valid depth invariant
    let snapshot = repomap_store.get_snapshot("myrepo", "s1").unwrap().unwrap();
    assert!(snapshot.validate_depths().is_ok());
    assert!(snapshot.get_node(&snapshot.root_node_id).is_some());

    // PageRank flowed into the map: run is called by main, so some node
    // carries a positive score
    assert!(snapshot.nodes.iter().any(|n| n.metrics.pagerank > 0.0));
}

#[tokio::test]
async fn test_parse_failure_skips_file_and_continues() {
    let (pipeline, _, _) = pipeline();

    let mut files = sources();
    files.push(SourceFile::new("app/broken.py", "%%broken%%", "python"));

    let output = pipeline
        .index_snapshot("myrepo", "s1", &files, None, &CancellationToken::new())
        .await
        .unwrap();

    // Two good files processed; the bad one is a parse-stage error
    assert_eq!(output.result.files_processed, 2);
    let parse_errors: Vec<_> = output.result.errors_in(Stage::Parse).collect();
    assert_eq!(parse_errors.len(), 1);
    assert_eq!(parse_errors[0].file_path.as_deref(), Some("app/broken.py"));
}

#[tokio::test]
async fn test_empty_repo_yields_root_only_map() {
    let (pipeline, _, repomap_store) = pipeline();

    let output = pipeline
        .index_snapshot("myrepo", "s1", &[], None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(output.result.files_processed, 0);

    let snapshot = repomap_store.get_snapshot("myrepo", "s1").unwrap().unwrap();
    // Repo root (plus the default project node) and nothing else
    assert!(snapshot.nodes.len() <= 2);
    assert!(snapshot.get_node(&snapshot.root_node_id).is_some());
}

#[tokio::test]
async fn test_cancellation_aborts_before_persistence() {
    let (pipeline, chunk_store, _) = pipeline();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = pipeline
        .index_snapshot("myrepo", "s1", &sources(), None, &cancel)
        .await;

    assert!(matches!(result, Err(AtlasError::Pipeline(_))));
    // No partial snapshot was written
    assert!(chunk_store.is_empty());
}

#[tokio::test]
async fn test_missing_repo_id_is_fatal() {
    let (pipeline, _, _) = pipeline();
    let result = pipeline
        .index_snapshot("", "s1", &sources(), None, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(AtlasError::FatalInput(_))));
}

#[tokio::test]
async fn test_refresh_roundtrip_with_moved_function() {
    let (pipeline, chunk_store, repomap_store) = pipeline();
    let cancel = CancellationToken::new();

    pipeline
        .index_snapshot("myrepo", "s1", &sources(), None, &cancel)
        .await
        .unwrap();

    // Same file with two blank lines prepended: functions move down
    let mut moved = sources();
    moved[0] = SourceFile::new(
        "app/main.py",
        "\n\ndef main():\n    # calls:run\n    x = 1\n    y = 2\n    z = x + y\n    return z\ndef run():\n    a = 1\n    b = 2\n    return a + b",
        "python",
    );

    let output = pipeline
        .refresh_snapshot("myrepo", "s1", "s2", &moved, None, &cancel)
        .await
        .unwrap();

    assert!(output.result.chunks_indexed > 0);

    // Moved chunks persisted with bumped versions
    let main_chunk = chunk_store
        .get_chunk("chunk:myrepo:function:app.main.main")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(main_chunk.version, 2);
    assert_eq!(main_chunk.start_line, Some(3));
    // Original span survives for drift tracking
    assert_eq!(main_chunk.original_start_line, Some(1));

    // New RepoMap snapshot exists alongside the old one
    assert_eq!(
        repomap_store.list_snapshots("myrepo").unwrap(),
        vec!["s1".to_string(), "s2".to_string()]
    );
}

#[tokio::test]
async fn test_index_documents_reference_chunks() {
    let (pipeline, _, _) = pipeline();

    let output = pipeline
        .index_snapshot("myrepo", "s1", &sources(), None, &CancellationToken::new())
        .await
        .unwrap();

    let by_id: HashMap<&str, _> = output
        .documents
        .iter()
        .map(|d| (d.id.as_str(), d))
        .collect();
    assert_eq!(by_id.len(), output.documents.len(), "document ids unique");

    let main_doc = by_id
        .get("chunk:myrepo:function:app.main.main")
        .expect("function document present");
    assert_eq!(main_doc.title, "main");
    assert_eq!(main_doc.path.as_deref(), Some("app/main.py"));
}
