//! Content hashing
//!
//! SHA-256 truncated to 16 bytes (32 hex chars). Used for chunk-id
//! disambiguation, summary cache keys, unchanged detection in incremental
//! refresh and rename detection. The hash is deterministic over the raw
//! bytes of a chunk's span text.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest
const HASH_HEX_LEN: usize = 32;

/// Compute the content hash of a text span
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let full = format!("{:x}", digest);
    full[..HASH_HEX_LEN].to_string()
}

/// First 8 characters of a hash, for id suffixes
pub fn hash_prefix(hash: &str) -> &str {
    &hash[..8.min(hash.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = content_hash("def helper(): return 1");
        let b = content_hash("def helper(): return 1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_hash_differs_on_content() {
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn test_hash_prefix() {
        let h = content_hash("x");
        assert_eq!(hash_prefix(&h).len(), 8);
        assert_eq!(hash_prefix("abc"), "abc");
    }
}
