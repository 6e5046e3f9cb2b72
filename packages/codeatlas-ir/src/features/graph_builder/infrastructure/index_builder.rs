// Index Builder - one-pass parallel index construction
//
// All indexes are rebuilt from the full edge list whenever it mutates, so
// reverse indexes stay consistent with the forward edges.

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;

use super::builder::GraphBuilderError;
use crate::features::graph_builder::domain::{GraphEdge, GraphIndex, GraphNode, RequestFlow};
use crate::shared::models::{GraphEdgeKind, GraphNodeKind};

pub struct IndexBuilder;

impl IndexBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build all graph indexes
    ///
    /// Independent index families run in parallel via `rayon::join`; the
    /// extended indexes depend on `outgoing_by_kind` and run after it.
    pub fn build_indexes(
        &self,
        nodes: &AHashMap<String, GraphNode>,
        edges: &[GraphEdge],
    ) -> Result<GraphIndex, GraphBuilderError> {
        let (
            ((called_by, imported_by, contains_children), (type_users, reads_by, writes_by)),
            ((outgoing, incoming), (outgoing_by_kind, incoming_by_kind)),
        ) = rayon::join(
            || {
                rayon::join(
                    || self.build_reverse_indexes(edges),
                    || self.build_data_flow_indexes(edges),
                )
            },
            || {
                rayon::join(
                    || self.build_adjacency_indexes(edges),
                    || self.build_kind_specific_indexes(edges),
                )
            },
        );

        let decorators_by_target = self.build_index_for_kind(edges, GraphEdgeKind::Decorates);
        let routes_by_path = self.build_routes_by_path_index(nodes);
        let services_by_domain = self.build_services_by_domain_index(nodes);
        let request_flow_index = self.build_request_flow_index(nodes, &outgoing_by_kind);

        Ok(GraphIndex {
            called_by,
            imported_by,
            contains_children,
            type_users,
            reads_by,
            writes_by,
            outgoing,
            incoming,
            outgoing_by_kind,
            incoming_by_kind,
            routes_by_path,
            services_by_domain,
            decorators_by_target,
            request_flow_index,
        })
    }

    /// Build path index for O(1) node lookup by file path
    pub fn build_path_index(
        &self,
        nodes: &AHashMap<String, GraphNode>,
    ) -> AHashMap<String, AHashSet<String>> {
        nodes
            .par_iter()
            .filter_map(|(node_id, node)| {
                node.path.as_ref().map(|path| (path.clone(), node_id.clone()))
            })
            .fold(AHashMap::new, |mut map, (path, node_id)| {
                map.entry(path).or_insert_with(AHashSet::new).insert(node_id);
                map
            })
            .reduce(AHashMap::new, |mut a, b| {
                for (path, ids) in b {
                    a.entry(path).or_insert_with(AHashSet::new).extend(ids);
                }
                a
            })
    }

    fn build_reverse_indexes(
        &self,
        edges: &[GraphEdge],
    ) -> (
        AHashMap<String, Vec<String>>,
        AHashMap<String, Vec<String>>,
        AHashMap<String, Vec<String>>,
    ) {
        let (called_by, (imported_by, contains_children)) = rayon::join(
            || self.build_index_for_kind(edges, GraphEdgeKind::Calls),
            || {
                rayon::join(
                    || self.build_index_for_kind(edges, GraphEdgeKind::Imports),
                    || self.build_index_for_kind_forward(edges, GraphEdgeKind::Contains),
                )
            },
        );
        (called_by, imported_by, contains_children)
    }

    fn build_data_flow_indexes(
        &self,
        edges: &[GraphEdge],
    ) -> (
        AHashMap<String, Vec<String>>,
        AHashMap<String, AHashSet<String>>,
        AHashMap<String, AHashSet<String>>,
    ) {
        let (type_users, (reads_by, writes_by)) = rayon::join(
            || self.build_index_for_kind(edges, GraphEdgeKind::ReferencesType),
            || {
                rayon::join(
                    || self.build_variable_index(edges, GraphEdgeKind::Reads),
                    || self.build_variable_index(edges, GraphEdgeKind::Writes),
                )
            },
        );
        (type_users, reads_by, writes_by)
    }

    fn build_adjacency_indexes(
        &self,
        edges: &[GraphEdge],
    ) -> (AHashMap<String, Vec<String>>, AHashMap<String, Vec<String>>) {
        rayon::join(
            || {
                edges
                    .par_iter()
                    .fold(AHashMap::new, |mut map: AHashMap<String, Vec<String>>, edge| {
                        map.entry(edge.source_id.clone())
                            .or_insert_with(Vec::new)
                            .push(edge.id.clone());
                        map
                    })
                    .reduce(AHashMap::new, merge_vec_maps)
            },
            || {
                edges
                    .par_iter()
                    .fold(AHashMap::new, |mut map: AHashMap<String, Vec<String>>, edge| {
                        map.entry(edge.target_id.clone())
                            .or_insert_with(Vec::new)
                            .push(edge.id.clone());
                        map
                    })
                    .reduce(AHashMap::new, merge_vec_maps)
            },
        )
    }

    fn build_kind_specific_indexes(
        &self,
        edges: &[GraphEdge],
    ) -> (
        AHashMap<(String, GraphEdgeKind), Vec<String>>,
        AHashMap<(String, GraphEdgeKind), Vec<String>>,
    ) {
        rayon::join(
            || {
                edges
                    .par_iter()
                    .fold(
                        AHashMap::new,
                        |mut map: AHashMap<(String, GraphEdgeKind), Vec<String>>, edge| {
                            map.entry((edge.source_id.clone(), edge.kind))
                                .or_insert_with(Vec::new)
                                .push(edge.target_id.clone());
                            map
                        },
                    )
                    .reduce(AHashMap::new, merge_vec_maps)
            },
            || {
                edges
                    .par_iter()
                    .fold(
                        AHashMap::new,
                        |mut map: AHashMap<(String, GraphEdgeKind), Vec<String>>, edge| {
                            map.entry((edge.target_id.clone(), edge.kind))
                                .or_insert_with(Vec::new)
                                .push(edge.source_id.clone());
                            map
                        },
                    )
                    .reduce(AHashMap::new, merge_vec_maps)
            },
        )
    }

    /// target → sources for one edge kind
    fn build_index_for_kind(
        &self,
        edges: &[GraphEdge],
        kind: GraphEdgeKind,
    ) -> AHashMap<String, Vec<String>> {
        edges
            .par_iter()
            .filter(|e| e.kind == kind)
            .fold(AHashMap::new, |mut map: AHashMap<String, Vec<String>>, edge| {
                map.entry(edge.target_id.clone())
                    .or_insert_with(Vec::new)
                    .push(edge.source_id.clone());
                map
            })
            .reduce(AHashMap::new, merge_vec_maps)
    }

    /// source → targets for one edge kind (CONTAINS)
    fn build_index_for_kind_forward(
        &self,
        edges: &[GraphEdge],
        kind: GraphEdgeKind,
    ) -> AHashMap<String, Vec<String>> {
        edges
            .par_iter()
            .filter(|e| e.kind == kind)
            .fold(AHashMap::new, |mut map: AHashMap<String, Vec<String>>, edge| {
                map.entry(edge.source_id.clone())
                    .or_insert_with(Vec::new)
                    .push(edge.target_id.clone());
                map
            })
            .reduce(AHashMap::new, merge_vec_maps)
    }

    /// variable id → set of CFG block ids (READS/WRITES sources)
    fn build_variable_index(
        &self,
        edges: &[GraphEdge],
        kind: GraphEdgeKind,
    ) -> AHashMap<String, AHashSet<String>> {
        edges
            .par_iter()
            .filter(|e| e.kind == kind)
            .fold(
                AHashMap::new,
                |mut map: AHashMap<String, AHashSet<String>>, edge| {
                    map.entry(edge.target_id.clone())
                        .or_insert_with(AHashSet::new)
                        .insert(edge.source_id.clone());
                    map
                },
            )
            .reduce(AHashMap::new, |mut a, b| {
                for (k, v) in b {
                    a.entry(k).or_insert_with(AHashSet::new).extend(v);
                }
                a
            })
    }

    fn build_routes_by_path_index(
        &self,
        nodes: &AHashMap<String, GraphNode>,
    ) -> AHashMap<String, Vec<String>> {
        nodes
            .par_iter()
            .filter(|(_, node)| node.kind == GraphNodeKind::Route)
            .filter_map(|(node_id, node)| {
                node.attrs
                    .get("route_path")
                    .or_else(|| node.attrs.get("path"))
                    .and_then(|v| v.as_str())
                    .map(|path| (path.to_string(), node_id.clone()))
            })
            .fold(AHashMap::new, |mut map: AHashMap<String, Vec<String>>, (path, id)| {
                map.entry(path).or_insert_with(Vec::new).push(id);
                map
            })
            .reduce(AHashMap::new, merge_vec_maps)
    }

    fn build_services_by_domain_index(
        &self,
        nodes: &AHashMap<String, GraphNode>,
    ) -> AHashMap<String, Vec<String>> {
        nodes
            .par_iter()
            .filter(|(_, node)| node.kind == GraphNodeKind::Service)
            .flat_map(|(node_id, node)| {
                let domains: Vec<String> = node
                    .attrs
                    .get("domain_tags")
                    .and_then(|v| {
                        if let Some(arr) = v.as_array() {
                            Some(
                                arr.iter()
                                    .filter_map(|v| v.as_str().map(String::from))
                                    .collect(),
                            )
                        } else {
                            v.as_str().map(|s| vec![s.to_string()])
                        }
                    })
                    .unwrap_or_default();

                domains
                    .into_iter()
                    .map(move |domain| (domain, node_id.clone()))
                    .collect::<Vec<_>>()
            })
            .fold(AHashMap::new, |mut map: AHashMap<String, Vec<String>>, (domain, id)| {
                map.entry(domain).or_insert_with(Vec::new).push(id);
                map
            })
            .reduce(AHashMap::new, merge_vec_maps)
    }

    /// Request flow: traversal Route → ROUTE_HANDLER → HANDLES_REQUEST →
    /// USES_REPOSITORY
    fn build_request_flow_index(
        &self,
        nodes: &AHashMap<String, GraphNode>,
        outgoing_by_kind: &AHashMap<(String, GraphEdgeKind), Vec<String>>,
    ) -> AHashMap<String, RequestFlow> {
        nodes
            .iter()
            .filter(|(_, node)| node.kind == GraphNodeKind::Route)
            .map(|(route_id, _)| {
                (
                    route_id.clone(),
                    self.trace_route_flow(route_id, outgoing_by_kind),
                )
            })
            .collect()
    }

    fn trace_route_flow(
        &self,
        route_id: &str,
        outgoing_by_kind: &AHashMap<(String, GraphEdgeKind), Vec<String>>,
    ) -> RequestFlow {
        let mut flow = RequestFlow::default();

        let handlers = outgoing_by_kind
            .get(&(route_id.to_string(), GraphEdgeKind::RouteHandler))
            .cloned()
            .unwrap_or_default();
        flow.handlers = handlers;

        for handler_id in flow.handlers.clone() {
            if let Some(services) =
                outgoing_by_kind.get(&(handler_id, GraphEdgeKind::HandlesRequest))
            {
                flow.services.extend(services.iter().cloned());
            }
        }

        for service_id in flow.services.clone() {
            if let Some(repos) =
                outgoing_by_kind.get(&(service_id, GraphEdgeKind::UsesRepository))
            {
                flow.repositories.extend(repos.iter().cloned());
            }
        }

        flow
    }
}

fn merge_vec_maps<K: std::hash::Hash + Eq>(
    mut a: AHashMap<K, Vec<String>>,
    b: AHashMap<K, Vec<String>>,
) -> AHashMap<K, Vec<String>> {
    for (k, v) in b {
        a.entry(k).or_insert_with(Vec::new).extend(v);
    }
    a
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
