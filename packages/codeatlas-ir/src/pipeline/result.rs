//! Pipeline result types

use serde::{Deserialize, Serialize};

/// Pipeline stage tags for collected errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    GraphBuild,
    Chunking,
    Mapping,
    Persistence,
    RepoMap,
    Summarize,
}

/// One collected, non-fatal error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
    pub file_path: Option<String>,
}

impl StageError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            file_path: None,
        }
    }

    pub fn for_file(stage: Stage, file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            file_path: Some(file_path.into()),
        }
    }
}

/// Outcome of one indexing run
///
/// The pipeline is partial-failure tolerant: every dropped or fallback item
/// is counted here rather than aborting the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingResult {
    pub repo_id: String,
    pub snapshot_id: String,
    pub files_processed: usize,
    pub chunks_created: usize,
    pub chunks_indexed: usize,
    pub errors: Vec<StageError>,
}

impl IndexingResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors_in(&self, stage: Stage) -> impl Iterator<Item = &StageError> {
        self.errors.iter().filter(move |e| e.stage == stage)
    }
}
