//! Error types for codeatlas-ir
//!
//! The pipeline is partial-failure tolerant: per-file, per-node and per-edge
//! errors stay local and are collected into the indexing result. Only fatal
//! input and failed snapshot persistence abort the whole run.

use thiserror::Error;

/// Main error type for codeatlas-ir operations
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Malformed repository input or missing required port; aborts the run
    #[error("Fatal input error: {0}")]
    FatalInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Per-file parse failure (captured as a diagnostic, file skipped)
    #[error("Parse error in {file_path}: {message}")]
    Parse { file_path: String, message: String },

    /// Chunk boundary violation; aborts the file's chunk production
    #[error("Boundary validation error: {0}")]
    BoundaryValidation(String),

    /// Chunk-id collision with resolution disabled
    #[error("Chunk id collision: {0}")]
    ChunkIdCollision(String),

    /// Graph build failure
    #[error("Graph error: {0}")]
    Graph(String),

    /// PageRank could not run; importance falls back to heuristics
    #[error("PageRank unavailable: {0}")]
    PageRankUnavailable(String),

    /// Per-node summarization failure
    #[error("LLM call error: {0}")]
    LlmCall(String),

    /// Storage failure; snapshot saves are atomic so retry is safe
    #[error("Storage error: {0}")]
    Storage(String),

    /// Pipeline orchestration error
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AtlasError {
    pub fn fatal(msg: impl Into<String>) -> Self {
        AtlasError::FatalInput(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        AtlasError::Storage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AtlasError::Config(msg.into())
    }
}

/// Result type alias for codeatlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;
