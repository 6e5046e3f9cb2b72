//! Git History Analyzer
//!
//! Reads `git log` over a lookback window (author dates) and derives:
//! - per-file stats (commit count, change_freq as commits/month,
//!   last-modified, contributor set)
//! - top-N hotspots
//! - line-level blame on demand (`git blame --porcelain`)
//! - co-change mining into an EvolutionGraph
//!
//! Incremental updates diff `since_commit..HEAD` and recompute stats only
//! for the touched files, merging cached stats for the rest.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::error::Result;
use super::git_executor::GitExecutor;
use crate::features::git_history::domain::{
    BlameInfo, CoChangePattern, EvolutionGraph, FileBlame, FileStats, Hotspot,
};

/// Days per month used to normalize change frequency
const DAYS_PER_MONTH: i64 = 30;

pub struct GitHistoryAnalyzer {
    executor: GitExecutor,
}

impl GitHistoryAnalyzer {
    pub fn new(executor: GitExecutor) -> Self {
        Self { executor }
    }

    /// Per-file statistics over the last `lookback_months` months
    pub fn file_stats(&self, lookback_months: u32) -> Result<HashMap<String, FileStats>> {
        let since = Utc::now() - Duration::days(lookback_months as i64 * DAYS_PER_MONTH);
        let since_arg = format!("--since={}", since.format("%Y-%m-%d"));

        let output = self.executor.run(&[
            "log",
            &since_arg,
            "--name-only",
            "--format=%H|%an|%aI",
            "--",
        ])?;

        Ok(Self::parse_log(&output, lookback_months))
    }

    fn parse_log(output: &str, lookback_months: u32) -> HashMap<String, FileStats> {
        let mut stats: HashMap<String, FileStats> = HashMap::new();

        let mut current_author: Option<String> = None;
        let mut current_date: Option<DateTime<Utc>> = None;
        let mut commit_counted: HashMap<String, HashSet<String>> = HashMap::new();
        let mut current_commit: Option<String> = None;

        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Commit header: hash|author|author-date
            let parts: Vec<&str> = line.splitn(3, '|').collect();
            if parts.len() == 3 && parts[0].len() == 40 && parts[0].chars().all(|c| c.is_ascii_hexdigit()) {
                current_commit = Some(parts[0].to_string());
                current_author = Some(parts[1].to_string());
                current_date = DateTime::parse_from_rfc3339(parts[2])
                    .ok()
                    .map(|d| d.with_timezone(&Utc));
                continue;
            }

            // File path line within the current commit
            let Some(commit) = &current_commit else { continue };
            let entry = stats.entry(line.to_string()).or_insert_with(|| FileStats {
                file_path: line.to_string(),
                ..Default::default()
            });

            let counted = commit_counted.entry(line.to_string()).or_default();
            if counted.insert(commit.clone()) {
                entry.commit_count += 1;
            }
            if let Some(author) = &current_author {
                entry.contributors.insert(author.clone());
            }
            if let Some(date) = current_date {
                if entry.last_modified.map(|prev| date > prev).unwrap_or(true) {
                    entry.last_modified = Some(date);
                }
            }
        }

        let months = lookback_months.max(1) as f64;
        for entry in stats.values_mut() {
            entry.change_freq = (entry.commit_count as f64 / months * 100.0).round() / 100.0;
        }

        stats
    }

    /// Top-N most frequently changed files
    pub fn hotspots(&self, top_n: usize, lookback_months: u32) -> Result<Vec<Hotspot>> {
        let stats = self.file_stats(lookback_months)?;
        let mut hotspots: Vec<Hotspot> = stats
            .into_values()
            .map(|s| Hotspot {
                file_path: s.file_path.clone(),
                change_freq: s.change_freq,
                contributor_count: s.contributor_count(),
                last_modified: s.last_modified,
            })
            .collect();
        hotspots.sort_by(|a, b| {
            b.change_freq
                .partial_cmp(&a.change_freq)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        hotspots.truncate(top_n);
        Ok(hotspots)
    }

    /// Line-level blame via `git blame --porcelain`
    pub fn file_blame(&self, file_path: &str) -> Result<FileBlame> {
        let output = self
            .executor
            .run(&["blame", "--porcelain", "--", file_path])?;
        Ok(Self::parse_blame(file_path, &output))
    }

    fn parse_blame(file_path: &str, output: &str) -> FileBlame {
        let mut blame = FileBlame {
            file_path: file_path.to_string(),
            lines: Vec::new(),
        };

        let mut commit_hash = String::new();
        let mut line_number = 0u32;
        let mut author = String::new();
        let mut author_email = String::new();
        let mut author_time: Option<DateTime<Utc>> = None;

        for line in output.lines() {
            if let Some(content) = line.strip_prefix('\t') {
                if let Some(time) = author_time {
                    blame.lines.push(BlameInfo {
                        line_number,
                        line_content: content.to_string(),
                        commit_hash: commit_hash.clone(),
                        author_name: author.clone(),
                        author_email: author_email.clone(),
                        author_time: time,
                    });
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("author ") {
                author = rest.to_string();
            } else if let Some(rest) = line.strip_prefix("author-mail ") {
                author_email = rest.trim_matches(['<', '>']).to_string();
            } else if let Some(rest) = line.strip_prefix("author-time ") {
                author_time = rest
                    .parse::<i64>()
                    .ok()
                    .and_then(|ts| DateTime::from_timestamp(ts, 0));
            } else {
                // Header: <commit> <orig_line> <final_line> [<num_lines>]
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 3 && parts[0].len() == 40 {
                    commit_hash = parts[0].to_string();
                    line_number = parts[2].parse().unwrap_or(0);
                }
            }
        }

        blame
    }

    /// Mine co-change patterns into an EvolutionGraph
    ///
    /// Pairs of files changed in the same commit; pairs below
    /// `min_co_changes` are dropped. Confidence is
    /// `co_changes / max(file_changes)`.
    pub fn evolution_graph(
        &self,
        lookback_months: u32,
        min_co_changes: u32,
    ) -> Result<EvolutionGraph> {
        let since = Utc::now() - Duration::days(lookback_months as i64 * DAYS_PER_MONTH);
        let since_arg = format!("--since={}", since.format("%Y-%m-%d"));

        let output = self
            .executor
            .run(&["log", &since_arg, "--name-only", "--format=%H", "--"])?;

        Ok(Self::parse_co_changes(&output, min_co_changes))
    }

    fn parse_co_changes(output: &str, min_co_changes: u32) -> EvolutionGraph {
        let mut commit_files: Vec<Vec<String>> = Vec::new();
        let mut file_changes: HashMap<String, u32> = HashMap::new();
        let mut current: Vec<String> = Vec::new();

        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.len() == 40 && line.chars().all(|c| c.is_ascii_hexdigit()) {
                if !current.is_empty() {
                    commit_files.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(line.to_string());
            *file_changes.entry(line.to_string()).or_insert(0) += 1;
        }
        if !current.is_empty() {
            commit_files.push(current);
        }

        let mut pair_counts: HashMap<(String, String), u32> = HashMap::new();
        for files in &commit_files {
            let mut sorted = files.clone();
            sorted.sort();
            sorted.dedup();
            for i in 0..sorted.len() {
                for j in (i + 1)..sorted.len() {
                    *pair_counts
                        .entry((sorted[i].clone(), sorted[j].clone()))
                        .or_insert(0) += 1;
                }
            }
        }

        let mut patterns: Vec<CoChangePattern> = pair_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_co_changes)
            .map(|((file_a, file_b), count)| {
                let max_changes = file_changes
                    .get(&file_a)
                    .copied()
                    .unwrap_or(0)
                    .max(file_changes.get(&file_b).copied().unwrap_or(0));
                let confidence = if max_changes > 0 {
                    (count as f64 / max_changes as f64 * 1000.0).round() / 1000.0
                } else {
                    0.0
                };
                CoChangePattern {
                    file_a,
                    file_b,
                    co_change_count: count,
                    confidence,
                }
            })
            .collect();
        patterns.sort_by(|a, b| {
            b.co_change_count
                .cmp(&a.co_change_count)
                .then_with(|| a.file_a.cmp(&b.file_a))
        });

        EvolutionGraph { patterns }
    }

    /// Incremental stats update since a commit
    ///
    /// Files untouched between `since_commit` and HEAD keep their cached
    /// stats; touched files are recomputed from the delta log and merged.
    pub fn incremental_update(
        &self,
        since_commit: &str,
        cached: &HashMap<String, FileStats>,
    ) -> Result<HashMap<String, FileStats>> {
        let diff = self
            .executor
            .run(&["diff", "--name-status", since_commit, "HEAD"])?;

        let changed_files: HashSet<String> = diff
            .lines()
            .filter_map(|line| line.split('\t').nth(1).map(|s| s.to_string()))
            .collect();

        if changed_files.is_empty() {
            return Ok(cached.clone());
        }
        debug!(changed = changed_files.len(), "incremental git stats update");

        let range = format!("{}..HEAD", since_commit);
        let output = self
            .executor
            .run(&["log", &range, "--name-only", "--format=%H|%an|%aI", "--"])?;
        let delta = Self::parse_log(&output, 1);

        let mut merged = cached.clone();
        for file_path in &changed_files {
            let old = cached.get(file_path);
            let new = delta.get(file_path);
            let stats = match (old, new) {
                (Some(old), Some(new)) => {
                    let mut contributors = old.contributors.clone();
                    contributors.extend(new.contributors.iter().cloned());
                    FileStats {
                        file_path: file_path.clone(),
                        commit_count: old.commit_count + new.commit_count,
                        change_freq: ((old.change_freq + new.change_freq) * 100.0).round() / 100.0,
                        last_modified: new.last_modified.or(old.last_modified),
                        contributors,
                    }
                }
                (None, Some(new)) => new.clone(),
                (Some(old), None) => old.clone(),
                (None, None) => continue,
            };
            merged.insert(file_path.clone(), stats);
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG_SAMPLE: &str = "\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa|alice|2025-06-01T10:00:00+00:00\n\
src/core.py\n\
src/utils.py\n\
\n\
bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb|bob|2025-06-10T12:00:00+00:00\n\
src/core.py\n\
\n\
cccccccccccccccccccccccccccccccccccccccc|alice|2025-07-02T09:30:00+00:00\n\
src/core.py\n\
src/utils.py\n";

    #[test]
    fn test_parse_log_stats() {
        let stats = GitHistoryAnalyzer::parse_log(LOG_SAMPLE, 6);

        let core = &stats["src/core.py"];
        assert_eq!(core.commit_count, 3);
        assert_eq!(core.contributors.len(), 2);
        assert!((core.change_freq - 0.5).abs() < 1e-9); // 3 commits / 6 months

        let utils = &stats["src/utils.py"];
        assert_eq!(utils.commit_count, 2);
        // Latest author date wins
        assert_eq!(
            utils.last_modified.unwrap().format("%Y-%m-%d").to_string(),
            "2025-07-02"
        );
    }

    #[test]
    fn test_parse_co_changes() {
        const CO_LOG: &str = "\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
a.py\n\
b.py\n\
\n\
bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\n\
a.py\n\
b.py\n\
\n\
cccccccccccccccccccccccccccccccccccccccc\n\
a.py\n\
b.py\n\
\n\
dddddddddddddddddddddddddddddddddddddddd\n\
a.py\n";

        let graph = GitHistoryAnalyzer::parse_co_changes(CO_LOG, 3);
        assert_eq!(graph.patterns.len(), 1);

        let pattern = &graph.patterns[0];
        assert_eq!(pattern.co_change_count, 3);
        // a.py changed 4 times, b.py 3 times: confidence = 3/4
        assert!((pattern.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_co_changes_below_min_dropped() {
        const CO_LOG: &str = "\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
a.py\n\
b.py\n";
        let graph = GitHistoryAnalyzer::parse_co_changes(CO_LOG, 3);
        assert!(graph.patterns.is_empty());
    }

    #[test]
    fn test_parse_blame() {
        const BLAME: &str = "\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa 1 1 2\n\
author alice\n\
author-mail <alice@example.com>\n\
author-time 1717236000\n\
author-tz +0000\n\
filename src/core.py\n\
\tdef main():\n\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa 2 2\n\
\t    run()\n";

        let blame = GitHistoryAnalyzer::parse_blame("src/core.py", BLAME);
        assert_eq!(blame.lines.len(), 2);
        assert_eq!(blame.lines[0].author_name, "alice");
        assert_eq!(blame.lines[0].author_email, "alice@example.com");
        assert_eq!(blame.lines[0].line_content, "def main():");
        assert_eq!(blame.lines[1].line_number, 2);
        assert_eq!(blame.primary_author(), Some("alice"));
    }
}
