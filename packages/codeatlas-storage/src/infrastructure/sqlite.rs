//! SQLite graph store
//!
//! Schema: one `graph_nodes` table plus one `edge_<kind>` table per edge
//! kind. Attributes are JSON text. Saves run as one transaction per batch
//! of 500 rows, keyed by node id and `(source_id, target_id)` so retries
//! are idempotent.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;

use codeatlas_ir::features::graph_builder::domain::{GraphDocument, GraphEdge, GraphNode};
use codeatlas_ir::shared::models::{GraphEdgeKind, GraphNodeKind, Span};
use tracing::{debug, info};

use crate::domain::GraphStore;
use crate::error::StorageError;
use crate::Result;

/// Rows per transaction
const BATCH_SIZE: usize = 500;

pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
}

impl SqliteGraphStore {
    /// Open (or create) a database file and ensure the schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// In-memory database, for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS graph_nodes (
                id          TEXT PRIMARY KEY,
                kind        TEXT NOT NULL,
                repo_id     TEXT NOT NULL,
                snapshot_id TEXT,
                fqn         TEXT NOT NULL,
                name        TEXT NOT NULL,
                path        TEXT,
                span        TEXT,
                attrs       TEXT NOT NULL DEFAULT '{}'
            );
            CREATE INDEX IF NOT EXISTS idx_nodes_repo ON graph_nodes (repo_id, snapshot_id);
            CREATE INDEX IF NOT EXISTS idx_nodes_kind ON graph_nodes (repo_id, kind);",
        )?;

        for kind in GraphEdgeKind::all() {
            let table = edge_table(*kind);
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    source_id TEXT NOT NULL,
                    target_id TEXT NOT NULL,
                    attrs     TEXT NOT NULL DEFAULT '{{}}',
                    PRIMARY KEY (source_id, target_id)
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_target ON {table} (target_id);"
            ))?;
        }

        Ok(())
    }

    fn upsert_nodes(&self, conn: &Connection, nodes: &[&GraphNode]) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO graph_nodes (id, kind, repo_id, snapshot_id, fqn, name, path, span, attrs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                repo_id = excluded.repo_id,
                snapshot_id = excluded.snapshot_id,
                fqn = excluded.fqn,
                name = excluded.name,
                path = excluded.path,
                span = excluded.span,
                attrs = excluded.attrs",
        )?;

        for node in nodes {
            let span_json = node
                .span
                .map(|s| serde_json::to_string(&s))
                .transpose()?;
            let attrs_json = serde_json::to_string(&node.attrs)?;
            stmt.execute(params![
                node.id,
                node.kind.as_str(),
                node.repo_id,
                node.snapshot_id,
                node.fqn,
                node.name,
                node.path,
                span_json,
                attrs_json,
            ])?;
        }
        Ok(())
    }

    fn upsert_edges(&self, conn: &Connection, edges: &[&GraphEdge]) -> Result<()> {
        for edge in edges {
            let table = edge_table(edge.kind);
            let attrs_json = serde_json::to_string(&edge.attrs)?;
            conn.execute(
                &format!(
                    "INSERT INTO {table} (source_id, target_id, attrs)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(source_id, target_id) DO UPDATE SET attrs = excluded.attrs"
                ),
                params![edge.source_id, edge.target_id, attrs_json],
            )?;
        }
        Ok(())
    }

    fn nodes_by_ids(&self, conn: &Connection, ids: &[String]) -> Result<Vec<GraphNode>> {
        let mut out = Vec::with_capacity(ids.len());
        let mut stmt = conn.prepare_cached(
            "SELECT id, kind, repo_id, snapshot_id, fqn, name, path, span, attrs
             FROM graph_nodes WHERE id = ?1",
        )?;
        for id in ids {
            let node = stmt
                .query_row(params![id], row_to_node)
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    e => Err(e),
                })?;
            if let Some(node) = node {
                out.push(node);
            }
        }
        Ok(out)
    }

    /// Sources of edges pointing at `target_id` in one edge table
    fn edge_sources(
        &self,
        conn: &Connection,
        kind: GraphEdgeKind,
        target_id: &str,
    ) -> Result<Vec<String>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT source_id FROM {} WHERE target_id = ?1 ORDER BY source_id",
            edge_table(kind)
        ))?;
        let rows = stmt.query_map(params![target_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Targets of edges leaving `source_id` in one edge table
    fn edge_targets(
        &self,
        conn: &Connection,
        kind: GraphEdgeKind,
        source_id: &str,
    ) -> Result<Vec<String>> {
        let mut stmt = stmt_targets(conn, kind)?;
        let rows = stmt.query_map(params![source_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn cascade_delete_edges(&self, conn: &Connection, node_ids: &[String]) -> Result<()> {
        for kind in GraphEdgeKind::all() {
            let table = edge_table(*kind);
            let mut stmt = conn.prepare_cached(&format!(
                "DELETE FROM {table} WHERE source_id = ?1 OR target_id = ?1"
            ))?;
            for id in node_ids {
                stmt.execute(params![id])?;
            }
        }
        Ok(())
    }

    fn delete_node_rows(&self, conn: &Connection, node_ids: &[String]) -> Result<usize> {
        let mut stmt = conn.prepare_cached("DELETE FROM graph_nodes WHERE id = ?1")?;
        let mut deleted = 0;
        for id in node_ids {
            deleted += stmt.execute(params![id])?;
        }
        self.cascade_delete_edges(conn, node_ids)?;
        Ok(deleted)
    }

    fn collect_node_ids(
        &self,
        conn: &Connection,
        repo_id: &str,
        snapshot_id: Option<&str>,
        kind: Option<GraphNodeKind>,
    ) -> Result<Vec<String>> {
        let mut sql = String::from("SELECT id FROM graph_nodes WHERE repo_id = ?1");
        if snapshot_id.is_some() {
            sql.push_str(" AND snapshot_id = ?2");
        }
        if kind.is_some() {
            sql.push_str(if snapshot_id.is_some() {
                " AND kind = ?3"
            } else {
                " AND kind = ?2"
            });
        }

        let mut stmt = conn.prepare(&sql)?;
        let ids: Vec<String> = match (snapshot_id, kind) {
            (Some(snap), Some(kind)) => stmt
                .query_map(params![repo_id, snap, kind.as_str()], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?,
            (Some(snap), None) => stmt
                .query_map(params![repo_id, snap], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?,
            (None, Some(kind)) => stmt
                .query_map(params![repo_id, kind.as_str()], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?,
            (None, None) => stmt
                .query_map(params![repo_id], |r| r.get(0))?
                .collect::<std::result::Result<_, _>>()?,
        };
        Ok(ids)
    }
}

fn stmt_targets<'c>(
    conn: &'c Connection,
    kind: GraphEdgeKind,
) -> Result<rusqlite::CachedStatement<'c>> {
    Ok(conn.prepare_cached(&format!(
        "SELECT target_id FROM {} WHERE source_id = ?1 ORDER BY target_id",
        edge_table(kind)
    ))?)
}

fn edge_table(kind: GraphEdgeKind) -> String {
    format!("edge_{}", kind.as_str().to_lowercase())
}

fn row_to_node(row: &rusqlite::Row<'_>) -> rusqlite::Result<GraphNode> {
    let kind_str: String = row.get(1)?;
    let kind: GraphNodeKind = serde_json::from_value(serde_json::Value::String(kind_str))
        .unwrap_or(GraphNodeKind::Function);
    let span: Option<String> = row.get(7)?;
    let attrs: String = row.get(8)?;

    Ok(GraphNode {
        id: row.get(0)?,
        kind,
        repo_id: row.get(2)?,
        snapshot_id: row.get(3)?,
        fqn: row.get(4)?,
        name: row.get(5)?,
        path: row.get(6)?,
        span: span.and_then(|s| serde_json::from_str::<Span>(&s).ok()),
        attrs: serde_json::from_str(&attrs).unwrap_or_default(),
    })
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn save_graph(&self, doc: &GraphDocument) -> Result<()> {
        let mut conn = self.conn.lock();

        // Nodes in sorted order for deterministic write batches
        let mut nodes: Vec<&GraphNode> = doc.graph_nodes.values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        for batch in nodes.chunks(BATCH_SIZE) {
            let tx = conn
                .transaction()
                .map_err(|e| StorageError::transaction(e.to_string()))?;
            self.upsert_nodes(&tx, batch)?;
            tx.commit()
                .map_err(|e| StorageError::transaction(e.to_string()))?;
        }

        let edges: Vec<&GraphEdge> = doc.graph_edges.iter().collect();
        for batch in edges.chunks(BATCH_SIZE) {
            let tx = conn
                .transaction()
                .map_err(|e| StorageError::transaction(e.to_string()))?;
            self.upsert_edges(&tx, batch)?;
            tx.commit()
                .map_err(|e| StorageError::transaction(e.to_string()))?;
        }

        info!(
            nodes = doc.graph_nodes.len(),
            edges = doc.graph_edges.len(),
            "graph saved"
        );
        Ok(())
    }

    async fn query_node_by_id(&self, node_id: &str) -> Result<Option<GraphNode>> {
        let conn = self.conn.lock();
        Ok(self
            .nodes_by_ids(&conn, &[node_id.to_string()])?
            .into_iter()
            .next())
    }

    async fn query_contains_children(&self, node_id: &str) -> Result<Vec<GraphNode>> {
        let conn = self.conn.lock();
        let ids = self.edge_targets(&conn, GraphEdgeKind::Contains, node_id)?;
        self.nodes_by_ids(&conn, &ids)
    }

    async fn query_called_by(&self, function_id: &str) -> Result<Vec<GraphNode>> {
        let conn = self.conn.lock();
        let ids = self.edge_sources(&conn, GraphEdgeKind::Calls, function_id)?;
        self.nodes_by_ids(&conn, &ids)
    }

    async fn query_imported_by(&self, module_id: &str) -> Result<Vec<GraphNode>> {
        let conn = self.conn.lock();
        let ids = self.edge_sources(&conn, GraphEdgeKind::Imports, module_id)?;
        self.nodes_by_ids(&conn, &ids)
    }

    async fn query_reads_variable(&self, variable_id: &str) -> Result<Vec<GraphNode>> {
        let conn = self.conn.lock();
        let ids = self.edge_sources(&conn, GraphEdgeKind::Reads, variable_id)?;
        self.nodes_by_ids(&conn, &ids)
    }

    async fn query_writes_variable(&self, variable_id: &str) -> Result<Vec<GraphNode>> {
        let conn = self.conn.lock();
        let ids = self.edge_sources(&conn, GraphEdgeKind::Writes, variable_id)?;
        self.nodes_by_ids(&conn, &ids)
    }

    async fn query_cfg_successors(&self, block_id: &str) -> Result<Vec<GraphNode>> {
        let conn = self.conn.lock();
        let mut ids = Vec::new();
        for kind in [
            GraphEdgeKind::CfgNext,
            GraphEdgeKind::CfgBranch,
            GraphEdgeKind::CfgLoop,
            GraphEdgeKind::CfgHandler,
        ] {
            ids.extend(self.edge_targets(&conn, kind, block_id)?);
        }
        ids.sort();
        ids.dedup();
        self.nodes_by_ids(&conn, &ids)
    }

    async fn delete_nodes(&self, node_ids: &[String]) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = self.delete_node_rows(&conn, node_ids)?;
        debug!(deleted, "nodes deleted with edge cascade");
        Ok(deleted)
    }

    async fn delete_repo(&self, repo_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let ids = self.collect_node_ids(&conn, repo_id, None, None)?;
        self.delete_node_rows(&conn, &ids)
    }

    async fn delete_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let ids = self.collect_node_ids(&conn, repo_id, Some(snapshot_id), None)?;
        self.delete_node_rows(&conn, &ids)
    }

    async fn delete_nodes_by_filter(
        &self,
        repo_id: &str,
        snapshot_id: Option<&str>,
        kind: Option<GraphNodeKind>,
    ) -> Result<usize> {
        let conn = self.conn.lock();
        let ids = self.collect_node_ids(&conn, repo_id, snapshot_id, kind)?;
        self.delete_node_rows(&conn, &ids)
    }

    async fn query_edges_of(&self, node_id: &str) -> Result<Vec<GraphEdge>> {
        let conn = self.conn.lock();
        let mut edges = Vec::new();
        for kind in GraphEdgeKind::all() {
            let table = edge_table(*kind);
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT source_id, target_id, attrs FROM {table}
                 WHERE source_id = ?1 OR target_id = ?1"
            ))?;
            let rows = stmt.query_map(params![node_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (source_id, target_id, attrs_json) = row?;
                let mut edge = GraphEdge::new(
                    format!("edge:{}:{}->{}", kind.as_str().to_lowercase(), source_id, target_id),
                    *kind,
                    source_id,
                    target_id,
                );
                edge.attrs = serde_json::from_str(&attrs_json).unwrap_or_default();
                edges.push(edge);
            }
        }
        Ok(edges)
    }
}
