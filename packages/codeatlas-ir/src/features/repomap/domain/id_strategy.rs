//! RepoMap ID strategy
//!
//! ID format: `repomap:{repo_id}:{snapshot_id}:{kind}:{identifier}` with
//! path separators normalized to dots. Identifiers longer than 200 chars
//! are truncated with a hash suffix so ids stay storable while remaining
//! deterministic.

use sha2::{Digest, Sha256};

use super::RepoMapKind;

const MAX_IDENTIFIER_LEN: usize = 200;
const TRUNCATED_PREFIX_LEN: usize = 180;

pub struct RepoMapIdGenerator;

impl RepoMapIdGenerator {
    pub fn generate(repo_id: &str, snapshot_id: &str, kind: RepoMapKind, identifier: &str) -> String {
        let mut identifier = identifier.replace(['/', '\\'], ".");

        if identifier.len() > MAX_IDENTIFIER_LEN {
            let mut hasher = Sha256::new();
            hasher.update(identifier.as_bytes());
            let digest = format!("{:x}", hasher.finalize());
            // Cut on a char boundary
            let mut cut = TRUNCATED_PREFIX_LEN;
            while !identifier.is_char_boundary(cut) {
                cut -= 1;
            }
            identifier = format!("{}...{}", &identifier[..cut], &digest[..8]);
        }

        format!(
            "repomap:{}:{}:{}:{}",
            repo_id,
            snapshot_id,
            kind.as_str(),
            identifier
        )
    }

    pub fn repo_root(repo_id: &str, snapshot_id: &str) -> String {
        Self::generate(repo_id, snapshot_id, RepoMapKind::Repo, "root")
    }

    pub fn dir(repo_id: &str, snapshot_id: &str, dir_path: &str) -> String {
        Self::generate(repo_id, snapshot_id, RepoMapKind::Dir, dir_path)
    }

    pub fn file(repo_id: &str, snapshot_id: &str, file_path: &str) -> String {
        Self::generate(repo_id, snapshot_id, RepoMapKind::File, file_path)
    }

    pub fn symbol(repo_id: &str, snapshot_id: &str, kind: RepoMapKind, fqn: &str) -> String {
        Self::generate(repo_id, snapshot_id, kind, fqn)
    }
}
