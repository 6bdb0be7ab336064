use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::bucket::TokenBucket;
use crate::class::RequestClass;

/// Operational counters for a single exchange's limiter, mirroring the
/// style of the scheduler's atomic counters: cheap, lock-free, `Clone`able.
#[derive(Clone, Default)]
pub struct RateLimitCounters {
    pub query_acquired: Arc<AtomicU64>,
    pub query_waited_ms: Arc<AtomicU64>,
    pub order_acquired: Arc<AtomicU64>,
    pub order_waited_ms: Arc<AtomicU64>,
    pub timeouts: Arc<AtomicU64>,
}

/// Per-exchange configuration: refill rates for each bucket, expressed as
/// tokens per second, and the burst capacity (`max_tokens`) each bucket
/// starts full with.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub query_per_sec: f64,
    pub order_per_sec: f64,
    pub query_burst: f64,
    pub order_burst: f64,
}

impl RateLimitConfig {
    /// Defaults matching spec §6/§8 for the Korean exchange gateway.
    pub fn kr_exchange_default() -> Self {
        Self {
            query_per_sec: 20.0,
            order_per_sec: 5.0,
            query_burst: 20.0,
            order_burst: 5.0,
        }
    }
}

/// A query bucket and an order bucket for one exchange account, gated
/// independently so a burst of order submissions can never starve market
/// data polling (or vice versa).
pub struct RateLimiter {
    query: TokenBucket,
    order: TokenBucket,
    counters: RateLimitCounters,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            query: TokenBucket::new(config.query_burst, config.query_per_sec),
            order: TokenBucket::new(config.order_burst, config.order_per_sec),
            counters: RateLimitCounters::default(),
        }
    }

    pub fn counters(&self) -> &RateLimitCounters {
        &self.counters
    }

    /// Acquire one token for `class`, waiting up to `timeout`. Returns
    /// `false` if the timeout elapses before a token frees up.
    pub async fn acquire(&self, class: RequestClass, timeout: Duration) -> bool {
        let started = tokio::time::Instant::now();
        let bucket = match class {
            RequestClass::Query => &self.query,
            RequestClass::Order => &self.order,
        };
        let granted = bucket.acquire(timeout).await;
        let waited_ms = started.elapsed().as_millis() as u64;

        let (acquired, waited) = match class {
            RequestClass::Query => (&self.counters.query_acquired, &self.counters.query_waited_ms),
            RequestClass::Order => (&self.counters.order_acquired, &self.counters.order_waited_ms),
        };
        if granted {
            acquired.fetch_add(1, Ordering::Relaxed);
            waited.fetch_add(waited_ms, Ordering::Relaxed);
        } else {
            self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(?class, timeout_ms = timeout.as_millis() as u64, "rate limit acquire timed out");
        }
        granted
    }
}

impl std::fmt::Debug for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestClass::Query => write!(f, "query"),
            RequestClass::Order => write!(f, "order"),
        }
    }
}
