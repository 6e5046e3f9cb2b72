//! Summary cache
//!
//! Keyed by chunk content hash, so identical code anywhere in the repo
//! reuses one summary. Only leaf summaries are cached; hierarchical
//! aggregations are not.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::features::repomap::domain::TwoLevelSummary;

pub trait SummaryCache: Send + Sync {
    fn get(&self, content_hash: &str) -> Option<TwoLevelSummary>;
    fn set(&self, content_hash: &str, summary: TwoLevelSummary);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory implementation; single-writer many-readers via RwLock
#[derive(Default)]
pub struct InMemorySummaryCache {
    entries: RwLock<HashMap<String, TwoLevelSummary>>,
}

impl InMemorySummaryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SummaryCache for InMemorySummaryCache {
    fn get(&self, content_hash: &str) -> Option<TwoLevelSummary> {
        self.entries.read().get(content_hash).cloned()
    }

    fn set(&self, content_hash: &str, summary: TwoLevelSummary) {
        self.entries
            .write()
            .insert(content_hash.to_string(), summary);
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_roundtrip() {
        let cache = InMemorySummaryCache::new();
        assert!(cache.get("h1").is_none());

        cache.set("h1", TwoLevelSummary::leaf("overview", "detail"));
        let hit = cache.get("h1").unwrap();
        assert_eq!(hit.overview, "overview");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
