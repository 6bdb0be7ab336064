use std::time::Duration;

use async_trait::async_trait;

/// A cache tier behind the L1 layer: a remote KV store (L2, no concrete
/// implementation shipped here — it's an external collaborator) or the
/// durable sqlite-backed store (L3, `SqliteCacheTier`). Failures are
/// reported via `anyhow::Result` and the multi-tier cache treats any `Err`
/// as a miss for that tier rather than a fatal error.
#[async_trait]
pub trait CacheTier: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>>;
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
    async fn invalidate_by_prefix(&self, prefix: &str) -> anyhow::Result<()>;
    async fn clear(&self) -> anyhow::Result<()>;
}
