//! Git history feature
//!
//! Change frequency, hotspots, blame and co-change mining from the git CLI.

pub mod domain;
pub mod infrastructure;

pub use domain::{CoChangePattern, EvolutionGraph, FileBlame, FileStats, Hotspot};
pub use infrastructure::{GitError, GitExecutor, GitHistoryAnalyzer};
