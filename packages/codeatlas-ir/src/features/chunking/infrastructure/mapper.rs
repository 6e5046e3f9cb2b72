//! Chunk ↔ IR / Graph mapping
//!
//! Strategy:
//! 1. Chunk → IR node: line-based containment; an IR node belongs to every
//!    chunk whose span fully contains it in the same file (many-to-many
//!    upward).
//! 2. Chunk → graph node: symbol-based with aggregation and filtering.
//!    - function: direct 1:1 from the chunk's symbol
//!    - class-like (class/service/repository/route/config/job/middleware):
//!      class symbol plus public direct-child method symbols
//!    - structural (file/module/project/repo): union of descendants,
//!      filtered through `GraphNodeFilter`

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::features::chunking::domain::{Chunk, ChunkKind, ChunkToGraph, ChunkToIr};
use crate::features::graph_builder::domain::GraphDocument;
use crate::shared::models::{GraphNodeKind, IrDocument};

/// Filters graph nodes for chunk mapping
///
/// Variables, fields and CFG blocks are excluded as too noisy for RAG;
/// unknown kinds are included and logged.
#[derive(Debug, Clone)]
pub struct GraphNodeFilter {
    include_kinds: HashSet<GraphNodeKind>,
    exclude_kinds: HashSet<GraphNodeKind>,
}

impl Default for GraphNodeFilter {
    fn default() -> Self {
        let include_kinds = [
            GraphNodeKind::Function,
            GraphNodeKind::Method,
            GraphNodeKind::Class,
            GraphNodeKind::Type,
            GraphNodeKind::Signature,
            GraphNodeKind::Module,
            GraphNodeKind::File,
            GraphNodeKind::Route,
            GraphNodeKind::Service,
            GraphNodeKind::Repository,
            GraphNodeKind::Config,
            GraphNodeKind::Job,
            GraphNodeKind::Middleware,
        ]
        .into_iter()
        .collect();

        let exclude_kinds = [GraphNodeKind::Variable, GraphNodeKind::CfgBlock]
            .into_iter()
            .collect();

        Self {
            include_kinds,
            exclude_kinds,
        }
    }
}

impl GraphNodeFilter {
    pub fn include(&self, kind: GraphNodeKind) -> bool {
        // Exclusion wins
        if self.exclude_kinds.contains(&kind) {
            return false;
        }
        if self.include_kinds.contains(&kind) {
            return true;
        }
        debug!(kind = %kind, "unknown graph node kind included in chunk mapping");
        true
    }
}

/// Maps chunks to IR nodes by line containment
pub struct ChunkMapper;

impl ChunkMapper {
    /// Map each IR node to every chunk whose span contains it
    pub fn map_ir(chunks: &[Chunk], ir_docs: &[&IrDocument]) -> ChunkToIr {
        let mut mapping: ChunkToIr = chunks
            .iter()
            .map(|c| (c.chunk_id.clone(), Vec::new()))
            .collect();

        // Chunks grouped by file for fewer comparisons
        let mut chunks_by_file: HashMap<&str, Vec<&Chunk>> = HashMap::new();
        for chunk in chunks {
            if let (Some(path), Some(_), Some(_)) =
                (chunk.file_path.as_deref(), chunk.start_line, chunk.end_line)
            {
                chunks_by_file.entry(path).or_default().push(chunk);
            }
        }

        for ir_doc in ir_docs {
            for ir_node in &ir_doc.nodes {
                let Some(candidates) = chunks_by_file.get(ir_node.file_path.as_str()) else {
                    continue;
                };
                for chunk in candidates {
                    let (Some(start), Some(end)) = (chunk.start_line, chunk.end_line) else {
                        continue;
                    };
                    if ir_node.span.start_line >= start && ir_node.span.end_line <= end {
                        mapping
                            .get_mut(&chunk.chunk_id)
                            .map(|ids| ids.push(ir_node.id.clone()));
                    }
                }
            }
        }

        // Deterministic order inside each entry
        for ids in mapping.values_mut() {
            ids.sort();
            ids.dedup();
        }

        mapping
    }
}

/// Configuration for chunk → graph mapping
#[derive(Debug, Clone, Default)]
pub struct ChunkGraphMapperConfig {
    /// Include INHERITS targets of the chunk's symbol
    pub include_inherits: bool,
    /// Include REFERENCES_TYPE targets of the chunk's symbol
    pub include_references: bool,
}

/// Maps chunks to graph nodes with aggregation and filtering
pub struct ChunkGraphMapper {
    filter: GraphNodeFilter,
    config: ChunkGraphMapperConfig,
}

impl ChunkGraphMapper {
    pub fn new(filter: GraphNodeFilter, config: ChunkGraphMapperConfig) -> Self {
        Self { filter, config }
    }

    pub fn map_graph(&self, chunks: &[Chunk], graph: &GraphDocument) -> ChunkToGraph {
        let mut mapping: HashMap<String, HashSet<String>> = chunks
            .iter()
            .map(|c| (c.chunk_id.clone(), HashSet::new()))
            .collect();

        let chunk_by_id: HashMap<&str, &Chunk> =
            chunks.iter().map(|c| (c.chunk_id.as_str(), c)).collect();

        // Phase 1: leaf functions map 1:1 to their symbol
        for chunk in chunks {
            if chunk.kind == ChunkKind::Function {
                if let Some(symbol_id) = &chunk.symbol_id {
                    if graph.get_node(symbol_id).is_some() {
                        mapping
                            .get_mut(&chunk.chunk_id)
                            .map(|s| s.insert(symbol_id.clone()));
                    }
                }
            }
        }

        // Phase 2: class-like chunks include the class symbol plus public
        // direct-child method symbols
        for chunk in chunks {
            if !chunk.kind.is_class_like() {
                continue;
            }
            let Some(entry) = mapping.get(&chunk.chunk_id) else {
                continue;
            };
            let mut ids = entry.clone();

            if let Some(symbol_id) = &chunk.symbol_id {
                if graph.get_node(symbol_id).is_some() {
                    ids.insert(symbol_id.clone());
                }
            }
            for child_id in &chunk.children {
                let Some(child) = chunk_by_id.get(child_id.as_str()) else {
                    continue;
                };
                if child.kind != ChunkKind::Function {
                    continue;
                }
                let public = child
                    .symbol_visibility
                    .as_deref()
                    .map(|v| v == "public")
                    .unwrap_or(true);
                if !public {
                    continue;
                }
                if let Some(symbol_id) = &child.symbol_id {
                    if graph.get_node(symbol_id).is_some() {
                        ids.insert(symbol_id.clone());
                    }
                }
            }

            if self.config.include_inherits || self.config.include_references {
                if let Some(symbol_id) = &chunk.symbol_id {
                    self.extend_with_relations(symbol_id, graph, &mut ids);
                }
            }

            mapping.insert(chunk.chunk_id.clone(), ids);
        }

        // Phase 3: structural chunks aggregate filtered descendants
        for chunk in chunks {
            if !chunk.kind.is_structural() {
                continue;
            }
            let mut descendant_ids = HashSet::new();
            self.collect_descendant_symbols(chunk, &chunk_by_id, &mapping, &mut descendant_ids);

            let filtered: HashSet<String> = descendant_ids
                .into_iter()
                .filter(|id| {
                    graph
                        .get_node(id)
                        .map(|n| self.filter.include(n.kind))
                        .unwrap_or(false)
                })
                .collect();

            mapping.insert(chunk.chunk_id.clone(), filtered);
        }

        // Stable output order
        mapping
            .into_iter()
            .map(|(k, v)| {
                let mut ids: Vec<String> = v.into_iter().collect();
                ids.sort();
                (k, ids)
            })
            .collect()
    }

    fn extend_with_relations(
        &self,
        symbol_id: &str,
        graph: &GraphDocument,
        ids: &mut HashSet<String>,
    ) {
        use crate::shared::models::GraphEdgeKind;

        if self.config.include_inherits {
            if let Some(targets) = graph
                .indexes
                .get_outgoing_by_kind(symbol_id, GraphEdgeKind::Inherits)
            {
                ids.extend(targets.iter().cloned());
            }
        }
        if self.config.include_references {
            if let Some(targets) = graph
                .indexes
                .get_outgoing_by_kind(symbol_id, GraphEdgeKind::ReferencesType)
            {
                ids.extend(targets.iter().cloned());
            }
        }
    }

    fn collect_descendant_symbols(
        &self,
        chunk: &Chunk,
        chunk_by_id: &HashMap<&str, &Chunk>,
        mapping: &HashMap<String, HashSet<String>>,
        out: &mut HashSet<String>,
    ) {
        for child_id in &chunk.children {
            if let Some(ids) = mapping.get(child_id) {
                out.extend(ids.iter().cloned());
            }
            if let Some(child) = chunk_by_id.get(child_id.as_str()) {
                self.collect_descendant_symbols(child, chunk_by_id, mapping, out);
            }
        }
    }
}

impl Default for ChunkGraphMapper {
    fn default() -> Self {
        Self::new(GraphNodeFilter::default(), ChunkGraphMapperConfig::default())
    }
}
