//! Chunk Boundary Validator
//!
//! Rules:
//! 1. Sibling chunks must not overlap (hard error, both ids and spans
//!    reported)
//! 2. `start_line <= end_line` for every chunk
//! 3. Gaps between siblings are permitted but logged (configurable)
//!
//! A secondary pass flags large classes whose estimated token count exceeds
//! a threshold, advising downstream flattening.

use thiserror::Error;
use tracing::{info, warn};

use crate::features::chunking::domain::{Chunk, ChunkKind};

/// Rough token estimate per source line
const TOKENS_PER_LINE: u32 = 20;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error(
        "Chunk overlap detected: {prev_id} (lines {prev_start}-{prev_end}) overlaps {curr_id} (lines {curr_start}-{curr_end})"
    )]
    Overlap {
        prev_id: String,
        prev_start: u32,
        prev_end: u32,
        curr_id: String,
        curr_start: u32,
        curr_end: u32,
    },

    #[error("Invalid line range in chunk {chunk_id}: start_line ({start}) > end_line ({end})")]
    InvalidRange {
        chunk_id: String,
        start: u32,
        end: u32,
    },

    #[error("Gap of {gap} lines between {prev_id} and {curr_id}")]
    Gap {
        prev_id: String,
        curr_id: String,
        gap: u32,
    },
}

/// Validates chunk boundaries for consistency
pub struct ChunkBoundaryValidator {
    allow_gaps: bool,
    large_class_threshold: u32,
}

impl ChunkBoundaryValidator {
    pub fn new(allow_gaps: bool, large_class_threshold: u32) -> Self {
        Self {
            allow_gaps,
            large_class_threshold,
        }
    }

    /// Validate all sibling groups
    pub fn validate(&self, chunks: &[Chunk]) -> Result<(), BoundaryError> {
        use std::collections::HashMap;

        let mut by_parent: HashMap<Option<&str>, Vec<&Chunk>> = HashMap::new();
        for chunk in chunks {
            by_parent
                .entry(chunk.parent_id.as_deref())
                .or_default()
                .push(chunk);
        }

        for siblings in by_parent.values() {
            self.validate_sibling_group(siblings)?;
        }

        Ok(())
    }

    fn validate_sibling_group(&self, siblings: &[&Chunk]) -> Result<(), BoundaryError> {
        let mut with_lines: Vec<&Chunk> = siblings
            .iter()
            .copied()
            .filter(|c| c.start_line.is_some() && c.end_line.is_some())
            .collect();

        if with_lines.is_empty() {
            return Ok(());
        }

        with_lines.sort_by_key(|c| c.start_line.unwrap_or(0));

        for chunk in &with_lines {
            let (start, end) = (chunk.start_line.unwrap_or(0), chunk.end_line.unwrap_or(0));
            if start > end {
                return Err(BoundaryError::InvalidRange {
                    chunk_id: chunk.chunk_id.clone(),
                    start,
                    end,
                });
            }
        }

        let mut prev: Option<&Chunk> = None;
        for current in &with_lines {
            let Some(p) = prev else {
                prev = Some(current);
                continue;
            };

            let (prev_start, prev_end) = (p.start_line.unwrap_or(0), p.end_line.unwrap_or(0));
            let (curr_start, curr_end) = (
                current.start_line.unwrap_or(0),
                current.end_line.unwrap_or(0),
            );

            if curr_start <= prev_end {
                return Err(BoundaryError::Overlap {
                    prev_id: p.chunk_id.clone(),
                    prev_start,
                    prev_end,
                    curr_id: current.chunk_id.clone(),
                    curr_start,
                    curr_end,
                });
            }

            if curr_start > prev_end + 1 {
                let gap = curr_start - prev_end - 1;
                if self.allow_gaps {
                    warn!(
                        prev = %p.chunk_id,
                        curr = %current.chunk_id,
                        gap,
                        "gap between sibling chunks"
                    );
                } else {
                    return Err(BoundaryError::Gap {
                        prev_id: p.chunk_id.clone(),
                        curr_id: current.chunk_id.clone(),
                        gap,
                    });
                }
            }

            prev = Some(current);
        }

        Ok(())
    }

    /// Flag class chunks whose estimated token count exceeds the threshold
    ///
    /// The flag is advisory; no splitting happens here.
    pub fn check_large_classes(&self, chunks: &[Chunk]) -> Vec<String> {
        let mut flagged = Vec::new();

        for chunk in chunks {
            if !chunk.kind.is_class_like() || chunk.kind == ChunkKind::Function {
                continue;
            }
            let Some(lines) = chunk.line_count() else {
                continue;
            };
            let estimated_tokens = lines * TOKENS_PER_LINE;
            if estimated_tokens > self.large_class_threshold {
                info!(
                    chunk = %chunk.chunk_id,
                    lines,
                    estimated_tokens,
                    "large class flagged for flattening"
                );
                flagged.push(chunk.chunk_id.clone());
            }
        }

        flagged
    }
}

impl Default for ChunkBoundaryValidator {
    fn default() -> Self {
        Self::new(true, 5000)
    }
}
