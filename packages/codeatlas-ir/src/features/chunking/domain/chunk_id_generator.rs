//! Chunk ID Generator
//!
//! ID format: `chunk:{repo_id}:{kind}:{fqn}[:{hash_suffix}]`
//!
//! The generator is stateful per build and must be reset between builds.
//! IDs are deterministic: rebuilding from the same input yields identical
//! ids in the same order. Thread-safe via `parking_lot::Mutex` so the
//! builder can be driven from rayon workers.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::shared::utils::hash_prefix;

/// Context for generating a chunk ID
#[derive(Debug, Clone)]
pub struct ChunkIdContext<'a> {
    pub repo_id: &'a str,
    pub kind: &'a str,
    /// Fully qualified name, path separators normalized to `.`
    pub fqn: &'a str,
    /// Content hash for collision disambiguation (first 8 chars used)
    pub content_hash: Option<&'a str>,
}

/// Outcome of one id generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedId {
    /// First emission of the base id
    Base(String),
    /// Collision resolved by appending the hash prefix
    Disambiguated(String),
    /// Collision with resolution disabled
    Collision(String),
}

impl GeneratedId {
    pub fn id(&self) -> &str {
        match self {
            GeneratedId::Base(id) | GeneratedId::Disambiguated(id) | GeneratedId::Collision(id) => {
                id
            }
        }
    }

    pub fn into_id(self) -> String {
        match self {
            GeneratedId::Base(id) | GeneratedId::Disambiguated(id) | GeneratedId::Collision(id) => {
                id
            }
        }
    }

    pub fn is_collision(&self) -> bool {
        matches!(self, GeneratedId::Collision(_))
    }
}

/// Chunk ID generator with collision resolution
#[derive(Debug, Clone)]
pub struct ChunkIdGenerator {
    seen: Arc<Mutex<HashSet<String>>>,
    /// When false, a second emission of the same base id reports a collision
    /// instead of appending the hash suffix
    resolve_collisions: bool,
}

impl ChunkIdGenerator {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(HashSet::new())),
            resolve_collisions: true,
        }
    }

    pub fn with_collision_resolution(resolve: bool) -> Self {
        Self {
            seen: Arc::new(Mutex::new(HashSet::new())),
            resolve_collisions: resolve,
        }
    }

    /// Generate a chunk id
    ///
    /// First emission of a base id returns it as-is; a second emission of
    /// the same `(repo, kind, fqn)` appends the first 8 chars of the
    /// content hash.
    pub fn generate(&self, ctx: &ChunkIdContext) -> GeneratedId {
        let fqn = normalize_fqn(ctx.fqn);
        let base = format!("chunk:{}:{}:{}", ctx.repo_id, ctx.kind, fqn);

        let mut seen = self.seen.lock();

        if !seen.contains(&base) {
            seen.insert(base.clone());
            return GeneratedId::Base(base);
        }

        if !self.resolve_collisions {
            return GeneratedId::Collision(base);
        }

        let suffix = ctx.content_hash.map(hash_prefix).unwrap_or("");
        let candidate = format!("{}:{}", base, suffix);
        seen.insert(candidate.clone());
        GeneratedId::Disambiguated(candidate)
    }

    /// Reset the seen set between builds
    pub fn reset(&self) {
        self.seen.lock().clear();
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.seen.lock().contains(chunk_id)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ChunkIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize path separators in FQNs to dots
pub fn normalize_fqn(fqn: &str) -> String {
    fqn.replace(['/', '\\'], ".")
}
