//! Parser port
//!
//! Language-specific AST extraction lives outside this crate. A parser
//! implementation receives a source file and returns a typed IR document
//! plus an optional semantic snapshot. Failures are per-file diagnostics;
//! the pipeline skips the file and continues.

use serde::{Deserialize, Serialize};

use crate::shared::models::{IrDocument, SemanticSnapshot};

/// Input to the parser port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_path: String,
    pub content: String,
    pub language: String,
}

impl SourceFile {
    pub fn new(
        file_path: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            content: content.into(),
            language: language.into(),
        }
    }

    /// Source text split into lines, as the chunk builder consumes it
    pub fn lines(&self) -> Vec<String> {
        self.content.lines().map(|l| l.to_string()).collect()
    }
}

/// Per-file parse diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    pub file_path: String,
    pub message: String,
    pub line: Option<u32>,
}

/// Result of parsing one file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub ir: IrDocument,
    pub semantic: Option<SemanticSnapshot>,
    /// Non-fatal extraction warnings
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Port consumed by the pipeline for stage 1–3 (parse → IR → semantic IR)
pub trait ParserPort: Send + Sync {
    /// Parse a source file into IR + semantic IR
    ///
    /// Returns `Err` only for a failed parse of this file; the error never
    /// aborts the whole pipeline.
    fn parse(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        source: &SourceFile,
    ) -> Result<ParsedFile, ParseDiagnostic>;

    /// Languages this parser understands (used to select files)
    fn supported_languages(&self) -> &[&str];
}
