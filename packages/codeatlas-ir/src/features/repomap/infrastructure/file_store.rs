//! RepoMap stores
//!
//! - `InMemoryRepoMapStore`: testing and single-process runs
//! - `FileRepoMapStore`: one JSON file per snapshot under
//!   `{base_dir}/{repo_id}/{snapshot_id}.json`, advisory lock file during
//!   writes, atomic temp-file-plus-rename so readers never see a torn
//!   snapshot, and an mtime-invalidated read cache.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::errors::{AtlasError, Result};
use crate::features::repomap::domain::{RepoMapNode, RepoMapSnapshot};
use crate::features::repomap::ports::RepoMapStore;

// ============================================================
// In-memory store
// ============================================================

#[derive(Default)]
pub struct InMemoryRepoMapStore {
    snapshots: RwLock<HashMap<(String, String), RepoMapSnapshot>>,
    nodes: RwLock<HashMap<String, RepoMapNode>>,
}

impl InMemoryRepoMapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepoMapStore for InMemoryRepoMapStore {
    fn save_snapshot(&self, snapshot: &RepoMapSnapshot) -> Result<()> {
        let key = (snapshot.repo_id.clone(), snapshot.snapshot_id.clone());
        let mut nodes = self.nodes.write();
        for node in &snapshot.nodes {
            nodes.insert(node.id.clone(), node.clone());
        }
        self.snapshots.write().insert(key, snapshot.clone());
        Ok(())
    }

    fn get_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<Option<RepoMapSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .get(&(repo_id.to_string(), snapshot_id.to_string()))
            .cloned())
    }

    fn list_snapshots(&self, repo_id: &str) -> Result<Vec<String>> {
        let mut out: Vec<String> = self
            .snapshots
            .read()
            .keys()
            .filter(|(r, _)| r == repo_id)
            .map(|(_, s)| s.clone())
            .collect();
        out.sort();
        Ok(out)
    }

    fn delete_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<()> {
        let removed = self
            .snapshots
            .write()
            .remove(&(repo_id.to_string(), snapshot_id.to_string()));
        if let Some(snapshot) = removed {
            let mut nodes = self.nodes.write();
            for node in &snapshot.nodes {
                nodes.remove(&node.id);
            }
        }
        Ok(())
    }

    fn get_node(&self, node_id: &str) -> Result<Option<RepoMapNode>> {
        Ok(self.nodes.read().get(node_id).cloned())
    }

    fn get_nodes_by_path(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        path: &str,
    ) -> Result<Vec<RepoMapNode>> {
        Ok(self
            .get_snapshot(repo_id, snapshot_id)?
            .map(|s| {
                s.nodes
                    .iter()
                    .filter(|n| n.path.as_deref() == Some(path))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_nodes_by_fqn(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        fqn: &str,
    ) -> Result<Vec<RepoMapNode>> {
        Ok(self
            .get_snapshot(repo_id, snapshot_id)?
            .map(|s| {
                s.nodes
                    .iter()
                    .filter(|n| n.fqn.as_deref() == Some(fqn))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_subtree(&self, node_id: &str) -> Result<Vec<RepoMapNode>> {
        let Some(node) = self.get_node(node_id)? else {
            return Ok(Vec::new());
        };
        let snapshots = self.snapshots.read();
        let Some(snapshot) = snapshots
            .get(&(node.repo_id.clone(), node.snapshot_id.clone()))
        else {
            return Ok(vec![node]);
        };
        Ok(snapshot
            .get_subtree(node_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn get_topk_by_importance(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        k: usize,
    ) -> Result<Vec<RepoMapNode>> {
        let Some(snapshot) = self.get_snapshot(repo_id, snapshot_id)? else {
            return Ok(Vec::new());
        };
        let mut nodes = snapshot.nodes;
        nodes.sort_by(|a, b| {
            b.metrics
                .importance
                .partial_cmp(&a.metrics.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        nodes.truncate(k);
        Ok(nodes)
    }
}

// ============================================================
// File-backed store
// ============================================================

pub struct FileRepoMapStore {
    base_dir: PathBuf,
    /// (path, mtime) → parsed snapshot
    cache: Mutex<HashMap<PathBuf, (SystemTime, RepoMapSnapshot)>>,
}

impl FileRepoMapStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn snapshot_path(&self, repo_id: &str, snapshot_id: &str) -> PathBuf {
        self.base_dir
            .join(sanitize(repo_id))
            .join(format!("{}.json", sanitize(snapshot_id)))
    }

    fn read_snapshot(&self, path: &Path) -> Result<Option<RepoMapSnapshot>> {
        if !path.exists() {
            return Ok(None);
        }

        let mtime = fs::metadata(path)?.modified()?;
        {
            let cache = self.cache.lock();
            if let Some((cached_mtime, snapshot)) = cache.get(path) {
                if *cached_mtime == mtime {
                    return Ok(Some(snapshot.clone()));
                }
            }
        }

        let data = fs::read_to_string(path)?;
        let snapshot: RepoMapSnapshot = serde_json::from_str(&data)
            .map_err(|e| AtlasError::storage(format!("corrupt snapshot {}: {}", path.display(), e)))?;
        self.cache
            .lock()
            .insert(path.to_path_buf(), (mtime, snapshot.clone()));
        Ok(Some(snapshot))
    }

    /// Scan all snapshots for node-level queries
    fn find_snapshot_containing(&self, node_id: &str) -> Result<Option<RepoMapSnapshot>> {
        // Node ids embed repo and snapshot: repomap:{repo}:{snapshot}:...
        let parts: Vec<&str> = node_id.splitn(4, ':').collect();
        if parts.len() == 4 && parts[0] == "repomap" {
            return self.read_snapshot(&self.snapshot_path(parts[1], parts[2]));
        }
        Ok(None)
    }
}

impl RepoMapStore for FileRepoMapStore {
    fn save_snapshot(&self, snapshot: &RepoMapSnapshot) -> Result<()> {
        let path = self.snapshot_path(&snapshot.repo_id, &snapshot.snapshot_id);
        let dir = path
            .parent()
            .ok_or_else(|| AtlasError::storage("snapshot path has no parent"))?;
        fs::create_dir_all(dir)?;

        // Advisory lock: O_EXCL lock file held for the duration of the write
        let lock_path = path.with_extension("lock");
        let _lock = LockFile::acquire(&lock_path)?;

        // Atomic write: temp file + rename prevents torn reads
        let tmp_path = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| AtlasError::storage(format!("serialize snapshot: {}", e)))?;
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &path)?;

        self.cache.lock().remove(&path);
        debug!(path = %path.display(), nodes = snapshot.nodes.len(), "snapshot saved");
        Ok(())
    }

    fn get_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<Option<RepoMapSnapshot>> {
        self.read_snapshot(&self.snapshot_path(repo_id, snapshot_id))
    }

    fn list_snapshots(&self, repo_id: &str) -> Result<Vec<String>> {
        let dir = self.base_dir.join(sanitize(repo_id));
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    out.push(stem.to_string());
                }
            }
        }
        out.sort();
        Ok(out)
    }

    fn delete_snapshot(&self, repo_id: &str, snapshot_id: &str) -> Result<()> {
        let path = self.snapshot_path(repo_id, snapshot_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        self.cache.lock().remove(&path);
        Ok(())
    }

    fn get_node(&self, node_id: &str) -> Result<Option<RepoMapNode>> {
        Ok(self
            .find_snapshot_containing(node_id)?
            .and_then(|s| s.get_node(node_id).cloned()))
    }

    fn get_nodes_by_path(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        path: &str,
    ) -> Result<Vec<RepoMapNode>> {
        Ok(self
            .get_snapshot(repo_id, snapshot_id)?
            .map(|s| {
                s.nodes
                    .iter()
                    .filter(|n| n.path.as_deref() == Some(path))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_nodes_by_fqn(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        fqn: &str,
    ) -> Result<Vec<RepoMapNode>> {
        Ok(self
            .get_snapshot(repo_id, snapshot_id)?
            .map(|s| {
                s.nodes
                    .iter()
                    .filter(|n| n.fqn.as_deref() == Some(fqn))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_subtree(&self, node_id: &str) -> Result<Vec<RepoMapNode>> {
        Ok(self
            .find_snapshot_containing(node_id)?
            .map(|s| s.get_subtree(node_id).into_iter().cloned().collect())
            .unwrap_or_default())
    }

    fn get_topk_by_importance(
        &self,
        repo_id: &str,
        snapshot_id: &str,
        k: usize,
    ) -> Result<Vec<RepoMapNode>> {
        let Some(snapshot) = self.get_snapshot(repo_id, snapshot_id)? else {
            return Ok(Vec::new());
        };
        let mut nodes = snapshot.nodes;
        nodes.sort_by(|a, b| {
            b.metrics
                .importance
                .partial_cmp(&a.metrics.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        nodes.truncate(k);
        Ok(nodes)
    }
}

/// RAII lock file; removed on drop
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: &Path) -> Result<Self> {
        use std::fs::OpenOptions;

        // Bounded retry; a stale lock from a crashed writer is broken after
        // the wait expires.
        for _ in 0..50 {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    std::thread::sleep(std::time::Duration::from_millis(20));
                }
                Err(e) => return Err(e.into()),
            }
        }
        let _ = fs::remove_file(path);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(|_| Self {
                path: path.to_path_buf(),
            })
            .map_err(|e| AtlasError::storage(format!("lock acquisition failed: {}", e)))
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn sanitize(id: &str) -> String {
    id.replace(['/', '\\', ':'], "_")
}
