//! RepoMap application layer

pub mod repomap_usecase;

pub use repomap_usecase::{RepoMapBuildInput, RepoMapBuilder};
