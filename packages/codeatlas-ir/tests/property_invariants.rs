//! Property-based invariant tests

use proptest::prelude::*;

use codeatlas_ir::features::chunking::domain::{
    normalize_fqn, ChunkIdContext, ChunkIdGenerator,
};
use codeatlas_ir::shared::models::Span;
use codeatlas_ir::shared::utils::content_hash;

proptest! {
    /// Re-hashing identical content yields the same digest across runs
    #[test]
    fn content_hash_is_deterministic(content in ".{0,512}") {
        let a = content_hash(&content);
        let b = content_hash(&content);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), 32);
    }

    /// Normalization is idempotent and never leaves path separators
    #[test]
    fn fqn_normalization_is_idempotent(fqn in "[a-zA-Z0-9_/\\\\.]{0,100}") {
        let once = normalize_fqn(&fqn);
        let twice = normalize_fqn(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains('/'));
        prop_assert!(!once.contains('\\'));
    }

    /// Distinct FQNs always produce distinct chunk ids
    #[test]
    fn chunk_ids_unique_for_distinct_fqns(fqns in proptest::collection::hash_set("[a-z]{1,12}(\\.[a-z]{1,12}){0,3}", 1..50)) {
        let generator = ChunkIdGenerator::new();
        let mut ids = std::collections::HashSet::new();
        for fqn in &fqns {
            let id = generator
                .generate(&ChunkIdContext {
                    repo_id: "repo",
                    kind: "function",
                    fqn,
                    content_hash: None,
                })
                .into_id();
            prop_assert!(ids.insert(id));
        }
    }

    /// Span containment is reflexive and antisymmetric on strict subsets
    #[test]
    fn span_containment(outer_start in 1u32..500, outer_len in 0u32..100, inset in 0u32..50) {
        let outer = Span::lines(outer_start, outer_start + outer_len);
        prop_assert!(outer.contains(&outer));

        let inner = Span::lines(
            outer_start + inset.min(outer_len),
            outer_start + outer_len,
        );
        prop_assert!(outer.contains(&inner));
        if inset > 0 && inset <= outer_len {
            prop_assert!(!inner.contains(&outer));
        }
    }
}
