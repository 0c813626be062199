//! Memoized ancestry lookups
//!
//! Wraps any `AncestryProvider` and caches sub-graphs keyed by
//! `(seed, max_depth)`. The wrapped provider is pure, so a cached answer is
//! always identical to a fresh one and accept/reject decisions do not change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use akg_core::{AncestryProvider, AncestrySubgraph};
use moka::sync::Cache;

/// Ancestry provider with an LRU memo in front of it
pub struct CachedAncestry<P> {
    inner: P,
    cache: Cache<(String, u32), Arc<AncestrySubgraph>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<P: AncestryProvider> CachedAncestry<P> {
    /// Wrap `inner`, keeping at most `max_capacity` sub-graphs
    pub fn new(inner: P, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(max_capacity).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> AncestryCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        AncestryCacheStats {
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

impl<P: AncestryProvider> AncestryProvider for CachedAncestry<P> {
    fn build_ancestry(&self, seed: &str, max_depth: u32) -> AncestrySubgraph {
        let key = (seed.to_string(), max_depth);
        if let Some(graph) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return graph.as_ref().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let graph = Arc::new(self.inner.build_ancestry(seed, max_depth));
        self.cache.insert(key, Arc::clone(&graph));
        graph.as_ref().clone()
    }
}

/// Snapshot of cache effectiveness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AncestryCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}
