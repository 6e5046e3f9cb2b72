//! codeatlas-storage - Graph Storage Adapter
//!
//! Persists the unified code graph behind the `GraphStore` port: one node
//! collection plus one relationship table per edge kind, node attributes
//! serialized as JSON, batched transactional UPSERTs keyed by node id and
//! `(source_id, target_id, kind)`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codeatlas_storage::{GraphStore, SqliteGraphStore};
//!
//! let store = SqliteGraphStore::open("atlas.db")?;
//! store.save_graph(&graph_doc).await?;
//! let callers = store.query_called_by("ir:f1").await?;
//! store.delete_snapshot("my-repo", "abc123").await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::GraphStore;
pub use error::{ErrorKind, Result, StorageError};

#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteGraphStore;
