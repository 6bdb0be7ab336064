use std::sync::Arc;

use tokio::sync::Mutex;

use crate::l1::L1Cache;
use crate::stats::CacheStats;
use crate::tier::CacheTier;
use crate::ttl::TtlTable;

/// Three-tier read-through cache: L1 in-process, optional L2 (remote KV,
/// supplied by the caller), optional L3 (durable, typically
/// `SqliteCacheTier`). `get` probes tiers in order and promotes a hit up
/// through the faster tiers it missed; `set` writes through every
/// configured tier. A failure in L2 or L3 is logged and treated as a miss
/// for that tier — it never turns a cache operation into a hard error.
pub struct MultiTierCache {
    l1: Mutex<L1Cache>,
    l2: Option<Arc<dyn CacheTier>>,
    l3: Option<Arc<dyn CacheTier>>,
    ttl: TtlTable,
    stats: CacheStats,
}

impl MultiTierCache {
    pub fn new(l1_capacity: usize, ttl: TtlTable) -> Self {
        Self {
            l1: Mutex::new(L1Cache::new(l1_capacity)),
            l2: None,
            l3: None,
            ttl,
            stats: CacheStats::default(),
        }
    }

    pub fn with_l2(mut self, tier: Arc<dyn CacheTier>) -> Self {
        self.l2 = Some(tier);
        self
    }

    pub fn with_l3(mut self, tier: Arc<dyn CacheTier>) -> Self {
        self.l3 = Some(tier);
        self
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        if let Some(value) = self.l1.lock().await.get(key) {
            self.stats.record_l1(true);
            self.stats.record_request(true);
            return Some(value);
        }
        self.stats.record_l1(false);

        if let Some(l2) = &self.l2 {
            match l2.get(key).await {
                Ok(Some(value)) => {
                    self.stats.record_l2(true);
                    self.stats.record_request(true);
                    self.promote(key, &value).await;
                    return Some(value);
                }
                Ok(None) => self.stats.record_l2(false),
                Err(e) => {
                    tracing::warn!(key, error = %e, "L2 cache tier unavailable, skipping");
                    self.stats.record_l2(false);
                }
            }
        }

        if let Some(l3) = &self.l3 {
            match l3.get(key).await {
                Ok(Some(value)) => {
                    self.stats.record_l3(true);
                    self.stats.record_request(true);
                    self.promote(key, &value).await;
                    return Some(value);
                }
                Ok(None) => self.stats.record_l3(false),
                Err(e) => {
                    tracing::warn!(key, error = %e, "L3 cache tier unavailable, skipping");
                    self.stats.record_l3(false);
                }
            }
        }

        self.stats.record_request(false);
        None
    }

    async fn promote(&self, key: &str, value: &serde_json::Value) {
        let ttl = self.ttl.ttl_for(key);
        self.l1.lock().await.set(key, value.clone(), ttl);
    }

    pub async fn set(&self, key: &str, value: serde_json::Value) {
        let ttl = self.ttl.ttl_for(key);
        self.l1.lock().await.set(key, value.clone(), ttl);

        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.set(key, value.clone(), ttl).await {
                tracing::warn!(key, error = %e, "L2 cache write-through failed");
            }
        }
        if let Some(l3) = &self.l3 {
            if let Err(e) = l3.set(key, value, ttl).await {
                tracing::warn!(key, error = %e, "L3 cache write-through failed");
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        self.l1.lock().await.delete(key);
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.delete(key).await {
                tracing::warn!(key, error = %e, "L2 cache delete failed");
            }
        }
        if let Some(l3) = &self.l3 {
            if let Err(e) = l3.delete(key).await {
                tracing::warn!(key, error = %e, "L3 cache delete failed");
            }
        }
    }

    pub async fn invalidate_by_prefix(&self, prefix: &str) {
        self.l1.lock().await.invalidate_by_prefix(prefix);
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.invalidate_by_prefix(prefix).await {
                tracing::warn!(prefix, error = %e, "L2 cache prefix invalidation failed");
            }
        }
        if let Some(l3) = &self.l3 {
            if let Err(e) = l3.invalidate_by_prefix(prefix).await {
                tracing::warn!(prefix, error = %e, "L3 cache prefix invalidation failed");
            }
        }
    }

    pub async fn clear(&self) {
        self.l1.lock().await.clear();
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.clear().await {
                tracing::warn!(error = %e, "L2 cache clear failed");
            }
        }
        if let Some(l3) = &self.l3 {
            if let Err(e) = l3.clear().await {
                tracing::warn!(error = %e, "L3 cache clear failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FlakyTier {
        fail: bool,
        store: StdMutex<std::collections::HashMap<String, serde_json::Value>>,
    }

    #[async_trait]
    impl CacheTier for FlakyTier {
        async fn get(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
            if self.fail {
                anyhow::bail!("tier unreachable");
            }
            Ok(self.store.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: serde_json::Value, _ttl: Duration) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("tier unreachable");
            }
            self.store.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.store.lock().unwrap().remove(key);
            Ok(())
        }
        async fn invalidate_by_prefix(&self, prefix: &str) -> anyhow::Result<()> {
            self.store.lock().unwrap().retain(|k, _| !k.starts_with(prefix));
            Ok(())
        }
        async fn clear(&self) -> anyhow::Result<()> {
            self.store.lock().unwrap().clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn miss_promotes_from_l3_into_l1() {
        let l3 = Arc::new(FlakyTier::default());
        l3.set("price:AAPL", serde_json::json!(1), Duration::from_secs(1)).await.unwrap();

        let cache = MultiTierCache::new(10, TtlTable::default_table()).with_l3(l3.clone());
        assert_eq!(cache.get("price:AAPL").await, Some(serde_json::json!(1)));
        assert_eq!(cache.stats().l1_misses.load(std::sync::atomic::Ordering::Relaxed), 1);
        assert_eq!(cache.stats().l3_hits.load(std::sync::atomic::Ordering::Relaxed), 1);

        // Second read should be served from L1 without touching L3 again.
        assert_eq!(cache.get("price:AAPL").await, Some(serde_json::json!(1)));
        assert_eq!(cache.stats().l1_hits.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn failing_tier_degrades_to_miss_not_panic() {
        let l2 = Arc::new(FlakyTier { fail: true, ..Default::default() });
        let cache = MultiTierCache::new(10, TtlTable::default_table()).with_l2(l2);
        assert_eq!(cache.get("price:AAPL").await, None);
    }

    #[tokio::test]
    async fn set_writes_through_every_tier() {
        let l2 = Arc::new(FlakyTier::default());
        let l3 = Arc::new(FlakyTier::default());
        let cache = MultiTierCache::new(10, TtlTable::default_table())
            .with_l2(l2.clone())
            .with_l3(l3.clone());

        cache.set("price:AAPL", serde_json::json!(42)).await;
        assert_eq!(l2.get("price:AAPL").await.unwrap(), Some(serde_json::json!(42)));
        assert_eq!(l3.get("price:AAPL").await.unwrap(), Some(serde_json::json!(42)));
    }
}
