//! Git history domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-file statistics over the lookback window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    pub file_path: String,
    pub commit_count: u32,
    /// Commits per month (30-day months, author dates)
    pub change_freq: f64,
    pub last_modified: Option<DateTime<Utc>>,
    pub contributors: HashSet<String>,
}

impl FileStats {
    pub fn contributor_count(&self) -> usize {
        self.contributors.len()
    }
}

/// A hotspot entry: one of the most frequently changed files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub file_path: String,
    pub change_freq: f64,
    pub contributor_count: usize,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Blame information for a single line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameInfo {
    pub line_number: u32,
    pub line_content: String,
    pub commit_hash: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: DateTime<Utc>,
}

/// Complete blame for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileBlame {
    pub file_path: String,
    pub lines: Vec<BlameInfo>,
}

impl FileBlame {
    /// Author who wrote the most lines
    pub fn primary_author(&self) -> Option<&str> {
        use std::collections::HashMap;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in &self.lines {
            *counts.entry(line.author_name.as_str()).or_insert(0) += 1;
        }
        counts.into_iter().max_by_key(|(_, c)| *c).map(|(a, _)| a)
    }

    /// Author of the most recent change
    pub fn last_modified_by(&self) -> Option<&str> {
        self.lines
            .iter()
            .max_by_key(|l| l.author_time)
            .map(|l| l.author_name.as_str())
    }
}

/// Files frequently changed together in one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoChangePattern {
    pub file_a: String,
    pub file_b: String,
    pub co_change_count: u32,
    /// co_changes / max(file_changes)
    pub confidence: f64,
}

/// Graph of co-change patterns mined from commit history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionGraph {
    pub patterns: Vec<CoChangePattern>,
}

impl EvolutionGraph {
    /// Files frequently changed with the given file, sorted by confidence
    pub fn related_files(&self, file_path: &str, min_confidence: f64) -> Vec<(String, f64)> {
        let mut related: Vec<(String, f64)> = self
            .patterns
            .iter()
            .filter_map(|p| {
                if p.confidence < min_confidence {
                    return None;
                }
                if p.file_a == file_path {
                    Some((p.file_b.clone(), p.confidence))
                } else if p.file_b == file_path {
                    Some((p.file_a.clone(), p.confidence))
                } else {
                    None
                }
            })
            .collect();
        related.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        related
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_files_sorted_by_confidence() {
        let graph = EvolutionGraph {
            patterns: vec![
                CoChangePattern {
                    file_a: "a.py".into(),
                    file_b: "b.py".into(),
                    co_change_count: 3,
                    confidence: 0.4,
                },
                CoChangePattern {
                    file_a: "a.py".into(),
                    file_b: "c.py".into(),
                    co_change_count: 8,
                    confidence: 0.9,
                },
                CoChangePattern {
                    file_a: "x.py".into(),
                    file_b: "a.py".into(),
                    co_change_count: 2,
                    confidence: 0.2,
                },
            ],
        };

        let related = graph.related_files("a.py", 0.3);
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].0, "c.py");
        assert_eq!(related[1].0, "b.py");
    }
}
