//! RepoMap domain models

pub mod config;
pub mod id_strategy;
pub mod models;

pub use config::RepoMapBuildConfig;
pub use id_strategy::RepoMapIdGenerator;
pub use models::{RepoMapKind, RepoMapMetrics, RepoMapNode, RepoMapSnapshot, TwoLevelSummary};
