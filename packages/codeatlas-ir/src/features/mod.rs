//! Feature modules

pub mod chunking;
pub mod git_history;
pub mod graph_builder;
pub mod indexing;
pub mod repomap;
