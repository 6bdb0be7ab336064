use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-tier hit/miss counters, read without touching any cache lock.
#[derive(Clone, Default)]
pub struct CacheStats {
    pub l1_hits: Arc<AtomicU64>,
    pub l1_misses: Arc<AtomicU64>,
    pub l2_hits: Arc<AtomicU64>,
    pub l2_misses: Arc<AtomicU64>,
    pub l3_hits: Arc<AtomicU64>,
    pub l3_misses: Arc<AtomicU64>,
    /// One entry per logical `get()` call: a hit at any tier counts once,
    /// a miss at every configured tier counts once. This is what
    /// `hit_rate` reports, as distinct from the per-tier probe counters
    /// above (a single `get()` can probe L1, L2 and L3 in turn).
    pub requests_hit: Arc<AtomicU64>,
    pub requests_missed: Arc<AtomicU64>,
}

impl CacheStats {
    pub fn record_l1(&self, hit: bool) {
        Self::bump(&self.l1_hits, &self.l1_misses, hit);
    }

    pub fn record_l2(&self, hit: bool) {
        Self::bump(&self.l2_hits, &self.l2_misses, hit);
    }

    pub fn record_l3(&self, hit: bool) {
        Self::bump(&self.l3_hits, &self.l3_misses, hit);
    }

    pub fn record_request(&self, hit: bool) {
        Self::bump(&self.requests_hit, &self.requests_missed, hit);
    }

    fn bump(hits: &AtomicU64, misses: &AtomicU64, hit: bool) {
        if hit {
            hits.fetch_add(1, Ordering::Relaxed);
        } else {
            misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Overall hit rate across logical requests, in `[0.0, 1.0]`. `0.0` if
    /// nothing has been requested yet.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.requests_hit.load(Ordering::Relaxed);
        let total = hits + self.requests_missed.load(Ordering::Relaxed);
        if total == 0 { 0.0 } else { hits as f64 / total as f64 }
    }
}
