//! Git history infrastructure

pub mod analyzer;
pub mod error;
pub mod git_executor;

pub use analyzer::GitHistoryAnalyzer;
pub use error::GitError;
pub use git_executor::GitExecutor;
