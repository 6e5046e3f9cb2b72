//! RepoMap feature
//!
//! Hierarchical importance ranking over the chunk tree: heuristics,
//! PageRank over the call/import subgraph, git-history signals and
//! bottom-up LLM summarization, with incremental update semantics.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{RepoMapBuildInput, RepoMapBuilder};
pub use domain::{RepoMapBuildConfig, RepoMapKind, RepoMapMetrics, RepoMapNode, RepoMapSnapshot};
pub use ports::RepoMapStore;
