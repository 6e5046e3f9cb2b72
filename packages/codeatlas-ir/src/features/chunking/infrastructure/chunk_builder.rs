//! Chunk Hierarchy Builder
//!
//! Builds the chunk tree from IR + GraphDocument:
//!     Repo → Project → Module → File → Class → Function
//!
//! Kind derivation is graph-first: the graph layer already mapped role tags
//! to extended node kinds, and the builder derives each chunk kind from the
//! graph node kind through a fixed mapping. Structural kinds come from the
//! hierarchy itself.
//!
//! A boundary violation aborts the offending file's chunk production; the
//! other files keep their chunks.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use super::boundary_validator::{BoundaryError, ChunkBoundaryValidator};
use super::fqn_builder::FqnBuilder;
use super::test_detector::TestDetector;
use super::visibility::VisibilityExtractor;
use crate::features::chunking::domain::{Chunk, ChunkIdContext, ChunkIdGenerator, ChunkKind};
use crate::features::graph_builder::domain::GraphDocument;
use crate::shared::models::{IrDocument, IrNode, IrNodeKind};
use crate::shared::utils::content_hash;

/// Chunk builder configuration
#[derive(Debug, Clone)]
pub struct ChunkBuilderConfig {
    /// Gaps between siblings warn instead of erroring
    pub allow_gaps: bool,
    /// Estimated-token threshold for the large-class advisory flag
    pub large_class_threshold: u32,
    /// Append a hash suffix on id collisions; when false a collision is an
    /// error
    pub resolve_collisions: bool,
}

impl Default for ChunkBuilderConfig {
    fn default() -> Self {
        Self {
            allow_gaps: true,
            large_class_threshold: 5000,
            resolve_collisions: true,
        }
    }
}

/// Per-file error captured during a build
#[derive(Debug, thiserror::Error)]
pub enum ChunkingError {
    #[error("boundary validation failed for {file_path}: {source}")]
    Boundary {
        file_path: String,
        #[source]
        source: BoundaryError,
    },

    #[error("chunk id collision: {0}")]
    IdCollision(String),
}

/// One file's input to the builder
#[derive(Debug)]
pub struct FileInput<'a> {
    pub ir: &'a IrDocument,
    /// Source lines, 0-indexed storage of 1-indexed spans
    pub file_text: &'a [String],
}

/// Builder output (mappings are computed by the ChunkMapper)
#[derive(Debug, Default)]
pub struct ChunkBuildOutput {
    /// All chunks, sorted by kind priority then FQN
    pub chunks: Vec<Chunk>,
    /// Class chunks flagged for downstream flattening
    pub large_classes: Vec<String>,
    /// Per-file failures; those files contributed no chunks
    pub file_errors: Vec<ChunkingError>,
}

pub struct ChunkBuilder {
    id_gen: ChunkIdGenerator,
    config: ChunkBuilderConfig,
    test_detector: TestDetector,
    hash_cache: HashMap<(String, u32, u32), String>,
}

impl ChunkBuilder {
    pub fn new(config: ChunkBuilderConfig) -> Self {
        let id_gen = ChunkIdGenerator::with_collision_resolution(config.resolve_collisions);
        Self {
            id_gen,
            config,
            test_detector: TestDetector::new(),
            hash_cache: HashMap::new(),
        }
    }

    /// Build the complete chunk tree for one snapshot
    ///
    /// Files are processed in path order, which together with the stateful
    /// id generator makes output ids deterministic for identical input.
    pub fn build_snapshot(
        &mut self,
        repo_id: &str,
        snapshot_id: &str,
        files: &[FileInput<'_>],
        graph: Option<&GraphDocument>,
    ) -> ChunkBuildOutput {
        self.id_gen.reset();
        self.hash_cache.clear();

        let mut output = ChunkBuildOutput::default();
        let validator =
            ChunkBoundaryValidator::new(self.config.allow_gaps, self.config.large_class_threshold);

        let mut repo_chunk = self.build_repo_chunk(repo_id, snapshot_id);
        let mut project_chunk = self.build_project_chunk(&repo_chunk, snapshot_id);
        repo_chunk.add_child(project_chunk.chunk_id.clone());

        // Module chunks are shared across files; fqn → chunk
        let mut module_chunks: HashMap<String, Chunk> = HashMap::new();

        let mut sorted_files: Vec<&FileInput<'_>> = files.iter().collect();
        sorted_files.sort_by(|a, b| a.ir.file_path.cmp(&b.ir.file_path));

        let mut file_level_chunks: Vec<Chunk> = Vec::new();

        for file in sorted_files {
            match self.build_file_tree(
                repo_id,
                snapshot_id,
                file,
                graph,
                &project_chunk,
                &mut module_chunks,
                &validator,
            ) {
                Ok(chunks) => file_level_chunks.extend(chunks),
                Err(e) => {
                    warn!(file = %file.ir.file_path, error = %e, "discarding file chunks");
                    output.file_errors.push(e);
                }
            }
        }

        // Module parents resolve to the enclosing module, or the project for
        // top-level modules; children lists follow the parent links.
        let mut modules: Vec<Chunk> = module_chunks.into_values().collect();
        modules.sort_by(|a, b| a.fqn.cmp(&b.fqn));

        let module_ids: HashMap<String, String> = modules
            .iter()
            .map(|m| (m.fqn.clone(), m.chunk_id.clone()))
            .collect();
        for module in &mut modules {
            let parent_fqn = module.fqn.rsplit_once('.').map(|(p, _)| p.to_string());
            module.parent_id = Some(
                parent_fqn
                    .and_then(|p| module_ids.get(&p).cloned())
                    .unwrap_or_else(|| project_chunk.chunk_id.clone()),
            );
        }

        let child_links: Vec<(String, String)> = modules
            .iter()
            .chain(file_level_chunks.iter())
            .filter_map(|c| c.parent_id.clone().map(|p| (p, c.chunk_id.clone())))
            .collect();
        for (parent_id, child_id) in child_links {
            if parent_id == project_chunk.chunk_id {
                project_chunk.add_child(child_id);
            } else if let Some(m) = modules.iter_mut().find(|m| m.chunk_id == parent_id) {
                m.add_child(child_id);
            }
        }

        let large = validator.check_large_classes(&file_level_chunks);
        for chunk in &mut file_level_chunks {
            if large.contains(&chunk.chunk_id) {
                chunk
                    .attrs
                    .insert("needs_flatten".to_string(), serde_json::Value::Bool(true));
            }
        }
        output.large_classes = large;

        let mut chunks = Vec::with_capacity(2 + modules.len() + file_level_chunks.len());
        chunks.push(repo_chunk);
        chunks.push(project_chunk);
        chunks.extend(modules);
        chunks.extend(file_level_chunks);

        // Deterministic order: kind priority, then FQN
        chunks.sort_by(|a, b| {
            a.kind
                .hierarchy_level()
                .cmp(&b.kind.hierarchy_level())
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
                .then_with(|| a.fqn.cmp(&b.fqn))
        });

        debug!(total = chunks.len(), "chunk build complete");
        output.chunks = chunks;
        output
    }

    // ============================================================
    // Structural hierarchy
    // ============================================================

    fn build_repo_chunk(&mut self, repo_id: &str, snapshot_id: &str) -> Chunk {
        let id = self.generate_id(repo_id, "repo", repo_id, None);
        Chunk::new(
            id,
            repo_id.to_string(),
            snapshot_id.to_string(),
            ChunkKind::Repo,
            repo_id.to_string(),
        )
    }

    fn build_project_chunk(&mut self, repo_chunk: &Chunk, snapshot_id: &str) -> Chunk {
        // Single default project; monorepo splitting comes from config later
        let project_name = "default";
        let id = self.generate_id(&repo_chunk.repo_id, "project", project_name, None);
        let mut chunk = Chunk::new(
            id.clone(),
            repo_chunk.repo_id.clone(),
            snapshot_id.to_string(),
            ChunkKind::Project,
            project_name.to_string(),
        );
        chunk.project_id = Some(id);
        chunk.parent_id = Some(repo_chunk.chunk_id.clone());
        chunk
    }

    /// Build module, file and symbol chunks for one file
    ///
    /// Returns the file-level chunks; module chunks accumulate in
    /// `module_chunks` because they are shared between files.
    #[allow(clippy::too_many_arguments)]
    fn build_file_tree(
        &mut self,
        repo_id: &str,
        snapshot_id: &str,
        file: &FileInput<'_>,
        graph: Option<&GraphDocument>,
        project_chunk: &Chunk,
        module_chunks: &mut HashMap<String, Chunk>,
        validator: &ChunkBoundaryValidator,
    ) -> Result<Vec<Chunk>, ChunkingError> {
        let ir = file.ir;
        let language = &ir.language;

        // Modules per dotted package segment
        let segments: Vec<&str> = Path::new(&ir.file_path)
            .parent()
            .map(|p| p.iter().filter_map(|s| s.to_str()).collect())
            .unwrap_or_default();

        let mut module_fqn = String::new();
        for segment in &segments {
            if module_fqn.is_empty() {
                module_fqn = segment.to_string();
            } else {
                module_fqn = format!("{}.{}", module_fqn, segment);
            }
            if !module_chunks.contains_key(&module_fqn) {
                let id = self.generate_id(repo_id, "module", &module_fqn, None);
                let mut chunk = Chunk::new(
                    id,
                    repo_id.to_string(),
                    snapshot_id.to_string(),
                    ChunkKind::Module,
                    module_fqn.clone(),
                );
                chunk.module_path = Some(module_fqn.clone());
                chunk.project_id = project_chunk.project_id.clone();
                chunk.language = Some(language.clone());
                module_chunks.insert(module_fqn.clone(), chunk);
            }
        }

        // File chunk
        let file_fqn = FqnBuilder::from_file_path(&ir.file_path, language);
        let file_hash = content_hash(&file.file_text.join("\n"));
        let file_id = self.generate_id(repo_id, "file", &file_fqn, Some(&file_hash));
        let mut file_chunk = Chunk::new(
            file_id.clone(),
            repo_id.to_string(),
            snapshot_id.to_string(),
            ChunkKind::File,
            file_fqn,
        );
        file_chunk.file_path = Some(ir.file_path.clone());
        file_chunk.module_path = (!module_fqn.is_empty()).then(|| module_fqn.clone());
        file_chunk.project_id = project_chunk.project_id.clone();
        file_chunk.language = Some(language.clone());
        if !file.file_text.is_empty() {
            file_chunk.start_line = Some(1);
            file_chunk.end_line = Some(file.file_text.len() as u32);
            file_chunk.original_start_line = Some(1);
            file_chunk.original_end_line = Some(file.file_text.len() as u32);
        }
        file_chunk.content_hash = Some(file_hash);
        file_chunk.parent_id = Some(
            module_chunks
                .get(&module_fqn)
                .map(|m| m.chunk_id.clone())
                .unwrap_or_else(|| project_chunk.chunk_id.clone()),
        );
        file_chunk.symbol_id = ir
            .nodes
            .iter()
            .find(|n| n.kind == IrNodeKind::File)
            .map(|n| n.id.clone());
        file_chunk.symbol_owner_id = file_chunk.symbol_id.clone();
        file_chunk.is_test = Some(TestDetector::is_test_path(&ir.file_path));

        // Symbol chunks, classes first so methods can resolve their parent
        let mut class_index: HashMap<String, String> = HashMap::new(); // fqn → chunk_id
        let mut symbol_chunks: Vec<Chunk> = Vec::new();

        for node in ir.nodes.iter().filter(|n| n.kind == IrNodeKind::Class) {
            let chunk = self.build_symbol_chunk(
                repo_id,
                snapshot_id,
                node,
                file,
                graph,
                &file_chunk,
                &class_index,
            )?;
            class_index.insert(node.fqn.clone(), chunk.chunk_id.clone());
            symbol_chunks.push(chunk);
        }

        for node in ir
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, IrNodeKind::Function | IrNodeKind::Method))
        {
            let chunk = self.build_symbol_chunk(
                repo_id,
                snapshot_id,
                node,
                file,
                graph,
                &file_chunk,
                &class_index,
            )?;
            symbol_chunks.push(chunk);
        }

        // Parent → children wiring within the file
        let links: Vec<(String, String)> = symbol_chunks
            .iter()
            .filter_map(|c| c.parent_id.clone().map(|p| (p, c.chunk_id.clone())))
            .collect();
        for (parent_id, child_id) in links {
            if parent_id == file_chunk.chunk_id {
                file_chunk.add_child(child_id);
            } else if let Some(parent) = symbol_chunks.iter_mut().find(|c| c.chunk_id == parent_id)
            {
                parent.add_child(child_id);
            }
        }

        // Boundary validation covers this file's chunks only; an error
        // discards all of them.
        let mut file_chunks = vec![file_chunk];
        file_chunks.extend(symbol_chunks);
        validator
            .validate(&file_chunks)
            .map_err(|source| ChunkingError::Boundary {
                file_path: ir.file_path.clone(),
                source,
            })?;

        Ok(file_chunks)
    }

    /// Build one class/function chunk, kind derived from the graph node
    #[allow(clippy::too_many_arguments)]
    fn build_symbol_chunk(
        &mut self,
        repo_id: &str,
        snapshot_id: &str,
        node: &IrNode,
        file: &FileInput<'_>,
        graph: Option<&GraphDocument>,
        file_chunk: &Chunk,
        class_index: &HashMap<String, String>,
    ) -> Result<Chunk, ChunkingError> {
        // Graph-first: graph node kind decides the chunk kind; the IR kind
        // is only the fallback when no graph is available.
        let kind = graph
            .and_then(|g| g.get_node(&node.id))
            .and_then(|gn| ChunkKind::from_graph_kind(gn.kind))
            .unwrap_or(match node.kind {
                IrNodeKind::Class => ChunkKind::Class,
                _ => ChunkKind::Function,
            });

        let code = self.extract_code_span(file.file_text, node.span.start_line, node.span.end_line);
        let hash = self.hash_cached(&node.file_path, node.span.start_line, node.span.end_line, &code);

        let generated = self.id_gen.generate(&ChunkIdContext {
            repo_id,
            kind: kind.as_str(),
            fqn: &node.fqn,
            content_hash: Some(&hash),
        });
        if generated.is_collision() {
            return Err(ChunkingError::IdCollision(generated.into_id()));
        }
        let chunk_id = generated.into_id();

        let mut chunk = Chunk::new(
            chunk_id,
            repo_id.to_string(),
            snapshot_id.to_string(),
            kind,
            node.fqn.clone(),
        );
        chunk.file_path = Some(node.file_path.clone());
        chunk.module_path = file_chunk.module_path.clone();
        chunk.project_id = file_chunk.project_id.clone();
        chunk.language = Some(node.language.clone());
        chunk.start_line = Some(node.span.start_line);
        chunk.end_line = Some(node.span.end_line);
        chunk.original_start_line = Some(node.span.start_line);
        chunk.original_end_line = Some(node.span.end_line);
        chunk.content_hash = Some(hash);
        chunk.symbol_id = Some(node.id.clone());
        // Re-exports carry the defining symbol in attrs; otherwise the chunk
        // owns its symbol.
        chunk.symbol_owner_id = node
            .attrs
            .get("owner_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| Some(node.id.clone()));
        chunk.symbol_visibility = Some(
            VisibilityExtractor::extract(&node.name, &node.language, Some(&node.attrs))
                .as_str()
                .to_string(),
        );

        let decorators: Option<Vec<String>> = node.attrs.get("decorators").and_then(|v| {
            v.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|d| d.as_str().map(String::from))
                    .collect()
            })
        });
        chunk.is_test = Some(match node.kind {
            IrNodeKind::Class => self.test_detector.is_test_class(&node.name, &node.file_path),
            _ => self.test_detector.is_test_function(
                &node.name,
                &node.file_path,
                decorators.as_deref(),
            ),
        });

        // Parent: enclosing class by FQN prefix, else the file
        let parent_fqn = node.fqn.rsplit_once('.').map(|(p, _)| p);
        chunk.parent_id = Some(
            parent_fqn
                .and_then(|p| class_index.get(p).cloned())
                .unwrap_or_else(|| file_chunk.chunk_id.clone()),
        );

        Ok(chunk)
    }

    // ============================================================
    // Helpers
    // ============================================================

    fn generate_id(
        &mut self,
        repo_id: &str,
        kind: &str,
        fqn: &str,
        hash: Option<&str>,
    ) -> String {
        self.id_gen
            .generate(&ChunkIdContext {
                repo_id,
                kind,
                fqn,
                content_hash: hash,
            })
            .into_id()
    }

    /// Extract code for a 1-indexed inclusive line range
    fn extract_code_span(&self, file_text: &[String], start_line: u32, end_line: u32) -> String {
        let start_idx = (start_line.saturating_sub(1)) as usize;
        let end_idx = end_line as usize;
        if start_idx >= file_text.len() {
            return String::new();
        }
        file_text[start_idx..end_idx.min(file_text.len())].join("\n")
    }

    fn hash_cached(&mut self, file_path: &str, start: u32, end: u32, code: &str) -> String {
        let key = (file_path.to_string(), start, end);
        if let Some(cached) = self.hash_cache.get(&key) {
            return cached.clone();
        }
        let hash = content_hash(code);
        self.hash_cache.insert(key, hash.clone());
        hash
    }
}

impl Default for ChunkBuilder {
    fn default() -> Self {
        Self::new(ChunkBuilderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Span;

    fn calculator_ir() -> (IrDocument, Vec<String>) {
        let source = "\"\"\"Example module\"\"\"\n\
def top_level_function():\n\
    return 42\n\
class Calculator:\n\
    def add(self, a, b):\n\
        return a + b\n\
    def subtract(self, a, b):\n\
        return a - b";
        let lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();

        let path = "backend/math/calculator.py";
        let mut ir = IrDocument::new("r", "s1", path, "python");
        ir.nodes = vec![
            IrNode::new(
                "ir:file",
                IrNodeKind::File,
                "backend.math.calculator",
                "calculator",
                path,
                Span::lines(1, 8),
                "python",
            ),
            IrNode::new(
                "ir:top",
                IrNodeKind::Function,
                "backend.math.calculator.top_level_function",
                "top_level_function",
                path,
                Span::lines(2, 3),
                "python",
            ),
            IrNode::new(
                "ir:calc",
                IrNodeKind::Class,
                "backend.math.calculator.Calculator",
                "Calculator",
                path,
                Span::lines(4, 8),
                "python",
            ),
            IrNode::new(
                "ir:add",
                IrNodeKind::Method,
                "backend.math.calculator.Calculator.add",
                "add",
                path,
                Span::lines(5, 6),
                "python",
            ),
            IrNode::new(
                "ir:sub",
                IrNodeKind::Method,
                "backend.math.calculator.Calculator.subtract",
                "subtract",
                path,
                Span::lines(7, 8),
                "python",
            ),
        ];
        (ir, lines)
    }

    #[test]
    fn test_basic_chunking_hierarchy() {
        let (ir, lines) = calculator_ir();
        let mut builder = ChunkBuilder::default();
        let output = builder.build_snapshot(
            "r",
            "s1",
            &[FileInput {
                ir: &ir,
                file_text: &lines,
            }],
            None,
        );

        assert!(output.file_errors.is_empty());

        let count = |kind: ChunkKind| output.chunks.iter().filter(|c| c.kind == kind).count();
        assert_eq!(count(ChunkKind::Repo), 1);
        assert_eq!(count(ChunkKind::Project), 1);
        assert_eq!(count(ChunkKind::Module), 2); // backend, backend.math
        assert_eq!(count(ChunkKind::File), 1);
        assert_eq!(count(ChunkKind::Class), 1);
        assert_eq!(count(ChunkKind::Function), 3);

        // Methods hang off the class chunk
        let class_chunk = output
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Class)
            .unwrap();
        let add = output
            .chunks
            .iter()
            .find(|c| c.fqn.ends_with("Calculator.add"))
            .unwrap();
        let sub = output
            .chunks
            .iter()
            .find(|c| c.fqn.ends_with("Calculator.subtract"))
            .unwrap();
        assert_eq!(add.parent_id.as_deref(), Some(class_chunk.chunk_id.as_str()));
        assert_eq!(sub.parent_id.as_deref(), Some(class_chunk.chunk_id.as_str()));
        assert!(class_chunk.children.contains(&add.chunk_id));

        // Free function hangs off the file chunk
        let file_chunk = output
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::File)
            .unwrap();
        let top = output
            .chunks
            .iter()
            .find(|c| c.fqn.ends_with("top_level_function"))
            .unwrap();
        assert_eq!(top.parent_id.as_deref(), Some(file_chunk.chunk_id.as_str()));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let (ir, lines) = calculator_ir();
        let files = [FileInput {
            ir: &ir,
            file_text: &lines,
        }];

        let mut builder_a = ChunkBuilder::default();
        let mut builder_b = ChunkBuilder::default();
        let a = builder_a.build_snapshot("r", "s1", &files, None);
        let b = builder_b.build_snapshot("r", "s1", &files, None);

        let ids_a: Vec<&String> = a.chunks.iter().map(|c| &c.chunk_id).collect();
        let ids_b: Vec<&String> = b.chunks.iter().map(|c| &c.chunk_id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_file_with_zero_definitions() {
        let mut ir = IrDocument::new("r", "s1", "scripts/empty.py", "python");
        ir.nodes = vec![IrNode::new(
            "ir:file",
            IrNodeKind::File,
            "scripts.empty",
            "empty",
            "scripts/empty.py",
            Span::lines(1, 2),
            "python",
        )];
        let lines = vec!["# nothing".to_string(), "".to_string()];

        let mut builder = ChunkBuilder::default();
        let output = builder.build_snapshot(
            "r",
            "s1",
            &[FileInput {
                ir: &ir,
                file_text: &lines,
            }],
            None,
        );

        let file_chunk = output
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::File)
            .unwrap();
        assert!(file_chunk.children.is_empty());
    }

    #[test]
    fn test_overlapping_siblings_discard_file() {
        let path = "app/broken.py";
        let mut ir = IrDocument::new("r", "s1", path, "python");
        ir.nodes = vec![
            IrNode::new(
                "ir:a",
                IrNodeKind::Function,
                "app.broken.a",
                "a",
                path,
                Span::lines(1, 10),
                "python",
            ),
            IrNode::new(
                "ir:b",
                IrNodeKind::Function,
                "app.broken.b",
                "b",
                path,
                Span::lines(5, 15),
                "python",
            ),
        ];
        let lines: Vec<String> = (0..15).map(|i| format!("line {}", i)).collect();

        let mut builder = ChunkBuilder::default();
        let output = builder.build_snapshot(
            "r",
            "s1",
            &[FileInput {
                ir: &ir,
                file_text: &lines,
            }],
            None,
        );

        assert_eq!(output.file_errors.len(), 1);
        // Repo/project/module survive; nothing file-level does
        assert!(!output.chunks.iter().any(|c| c.file_path.as_deref() == Some(path)));
    }

    #[test]
    fn test_empty_repo() {
        let mut builder = ChunkBuilder::default();
        let output = builder.build_snapshot("r", "s1", &[], None);
        assert_eq!(output.chunks.len(), 2); // repo + project only
    }

    #[test]
    fn test_duplicate_fqn_gets_hash_suffix() {
        // Same FQN twice with different bodies (e.g. conditional definition)
        let path = "app/dup.py";
        let mut ir = IrDocument::new("r", "s1", path, "python");
        ir.nodes = vec![
            IrNode::new(
                "ir:f1",
                IrNodeKind::Function,
                "app.dup.f",
                "f",
                path,
                Span::lines(1, 2),
                "python",
            ),
            IrNode::new(
                "ir:f2",
                IrNodeKind::Function,
                "app.dup.f",
                "f",
                path,
                Span::lines(4, 5),
                "python",
            ),
        ];
        let lines: Vec<String> = vec![
            "def f():".into(),
            "    return 1".into(),
            "".into(),
            "def f():".into(),
            "    return 2".into(),
        ];

        let mut builder = ChunkBuilder::default();
        let output = builder.build_snapshot(
            "r",
            "s1",
            &[FileInput {
                ir: &ir,
                file_text: &lines,
            }],
            None,
        );

        let funcs: Vec<&Chunk> = output
            .chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Function)
            .collect();
        assert_eq!(funcs.len(), 2);
        assert_ne!(funcs[0].chunk_id, funcs[1].chunk_id);
        assert!(funcs.iter().any(|c| c.chunk_id.matches(':').count() == 4));
    }
}
