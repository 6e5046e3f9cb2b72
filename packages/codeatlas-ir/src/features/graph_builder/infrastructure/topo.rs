//! Dependency-aware ordering
//!
//! Code graphs are cyclic (mutual recursion, import cycles), so topological
//! operations compute strongly-connected components first and treat each
//! SCC as one unit. The output orders dependencies before their dependents,
//! for context assembly.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

use crate::features::graph_builder::domain::GraphDocument;
use crate::shared::models::GraphEdgeKind;

/// One ordering unit: a strongly-connected component of the dependency
/// subgraph. Singleton components are the common case; larger ones are
/// cycles that must be consumed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub node_ids: Vec<String>,
}

impl DependencyGroup {
    pub fn is_cycle(&self) -> bool {
        self.node_ids.len() > 1
    }
}

/// Orders graph nodes dependency-first over CALLS and IMPORTS edges
pub struct DependencyOrdering;

impl DependencyOrdering {
    /// Compute SCC groups in dependency order
    ///
    /// A group appears before any group that depends on it. Within a
    /// group, node ids are sorted for determinism.
    pub fn compute(doc: &GraphDocument) -> Vec<DependencyGroup> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut index_of = HashMap::new();

        let mut node_ids: Vec<&String> = doc.graph_nodes.keys().collect();
        node_ids.sort();
        for id in node_ids {
            let idx = graph.add_node(id.clone());
            index_of.insert(id.clone(), idx);
        }

        for edge in &doc.graph_edges {
            if !matches!(edge.kind, GraphEdgeKind::Calls | GraphEdgeKind::Imports) {
                continue;
            }
            let (Some(&source), Some(&target)) = (
                index_of.get(&edge.source_id),
                index_of.get(&edge.target_id),
            ) else {
                continue;
            };
            graph.add_edge(source, target, ());
        }

        // tarjan_scc emits components in reverse topological order: every
        // component precedes the ones that point at it, which is exactly
        // dependencies-first.
        tarjan_scc(&graph)
            .into_iter()
            .map(|component| {
                let mut ids: Vec<String> =
                    component.into_iter().map(|idx| graph[idx].clone()).collect();
                ids.sort();
                DependencyGroup { node_ids: ids }
            })
            .collect()
    }
}
