use std::sync::Arc;
use std::time::Duration;

use cache::MultiTierCache;
use chrono::Utc;
use ratelimit::{RateLimiter, classify};
use tokio::sync::Mutex;

use crate::error::BrokerError;
use crate::retry::RetryPolicy;
use crate::token::OAuthToken;
use crate::transport::{VendorRequest, VendorTransport};

const RATE_LIMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether a failed request is safe to retry once the HTTP send has been
/// attempted. Query endpoints are read-only and always safe; order
/// endpoints are not — a transport failure after the bytes are on the
/// wire is ambiguous, so the caller must reconcile via order-status
/// lookup instead of the gateway silently retrying.
fn send_is_retryable(class: ratelimit::RequestClass) -> bool {
    matches!(class, ratelimit::RequestClass::Query)
}

/// Drives one account's requests through cache, rate limiting, the token
/// lifecycle, and retry, per spec §4.5. One instance is meant to be kept
/// as a process-wide singleton per credential set (see
/// `singleton::GatewayRegistry`) so buckets and cache are shared across
/// every caller.
pub struct BrokerGateway<T: VendorTransport> {
    transport: T,
    rate_limiter: RateLimiter,
    cache: Arc<MultiTierCache>,
    token: Mutex<Option<OAuthToken>>,
    retry: RetryPolicy,
    account_prefix: String,
}

impl<T: VendorTransport> BrokerGateway<T> {
    pub fn new(transport: T, rate_limiter: RateLimiter, cache: Arc<MultiTierCache>, account_prefix: impl Into<String>) -> Self {
        Self {
            transport,
            rate_limiter,
            cache,
            token: Mutex::new(None),
            retry: RetryPolicy::default(),
            account_prefix: account_prefix.into(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn ensure_token(&self) -> Result<OAuthToken, BrokerError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.is_usable(Utc::now()) {
                return Ok(token.clone());
            }
        }
        tracing::info!(account = %self.account_prefix, "refreshing broker token");
        let fresh = self.transport.fetch_token().await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Run `request` through the full pipeline and return the raw vendor
    /// JSON body. `cache_key`, when set, is probed before the network call
    /// and written through on success. `mutates_account` invalidates every
    /// cached key under this account's prefix on success.
    pub async fn execute(
        &self,
        request: VendorRequest,
        cache_key: Option<String>,
        mutates_account: bool,
    ) -> Result<serde_json::Value, BrokerError> {
        let class = classify(&request.api_id);

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key).await {
                return Ok(cached);
            }
        }

        if !self.rate_limiter.acquire(class, RATE_LIMIT_TIMEOUT).await {
            return Err(BrokerError::RateLimit);
        }

        let send_retryable = send_is_retryable(class);
        let mut attempt = 0;
        loop {
            let token = match self.ensure_token().await {
                Ok(token) => token,
                Err(e) if e.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    self.backoff_and_warn(&request.api_id, attempt, &e).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.transport.send(&token, &request).await {
                Ok(value) => {
                    if let Some(key) = &cache_key {
                        self.cache.set(key, value.clone()).await;
                    }
                    if mutates_account {
                        self.cache.invalidate_by_prefix(&self.account_prefix).await;
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if e.invalidates_token() {
                        self.invalidate_token().await;
                    }
                    if send_retryable && e.is_retryable() && attempt + 1 < self.retry.max_attempts {
                        self.backoff_and_warn(&request.api_id, attempt, &e).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(if matches!(class, ratelimit::RequestClass::Order) {
                        BrokerError::OrderError(e.to_string())
                    } else {
                        e
                    });
                }
            }
        }
    }

    async fn backoff_and_warn(&self, api_id: &str, attempt: u32, error: &BrokerError) {
        let delay = self.retry.delay_for_attempt(attempt);
        tracing::warn!(api_id, attempt, ?delay, %error, "retrying broker request");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::FALLBACK_LIFETIME;
    use async_trait::async_trait;
    use cache::TtlTable;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyTransport {
        fail_sends: AtomicU32,
    }

    #[async_trait]
    impl VendorTransport for FlakyTransport {
        async fn fetch_token(&self) -> Result<OAuthToken, BrokerError> {
            Ok(OAuthToken { value: "tok".to_string(), token_type: "Bearer".to_string(), expires_at: Utc::now() + FALLBACK_LIFETIME })
        }
        async fn send(&self, _token: &OAuthToken, request: &VendorRequest) -> Result<serde_json::Value, BrokerError> {
            if request.api_id == "get_ticker" && self.fail_sends.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(BrokerError::Network("connection reset".to_string()));
            }
            Ok(serde_json::json!({ "price": 70000 }))
        }
    }

    fn gateway(fail_sends: u32) -> BrokerGateway<FlakyTransport> {
        BrokerGateway::new(
            FlakyTransport { fail_sends: AtomicU32::new(fail_sends) },
            RateLimiter::new(ratelimit::RateLimitConfig::kr_exchange_default()),
            Arc::new(MultiTierCache::new(100, TtlTable::default_table())),
            "account:acct-1:",
        )
    }

    #[tokio::test]
    async fn read_request_retries_transport_failures() {
        let gw = gateway(1);
        let result = gw
            .execute(VendorRequest::get("get_ticker", "/ticker"), Some("price:005930".to_string()), false)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn order_send_failure_is_not_retried() {
        let gw = BrokerGateway::new(
            FlakyTransport { fail_sends: AtomicU32::new(10) },
            RateLimiter::new(ratelimit::RateLimitConfig::kr_exchange_default()),
            Arc::new(MultiTierCache::new(100, TtlTable::default_table())),
            "account:acct-1:",
        );
        let mut request = VendorRequest::post("place_order", "/orders", serde_json::json!({}));
        request.api_id = "place_order".to_string();
        let result = gw.execute(request, None, true).await;
        assert!(matches!(result, Err(BrokerError::OrderError(_))));
    }

    struct AuthExpiredOnceTransport {
        token_fetches: AtomicU32,
        failed_once: AtomicU32,
    }

    #[async_trait]
    impl VendorTransport for AuthExpiredOnceTransport {
        async fn fetch_token(&self) -> Result<OAuthToken, BrokerError> {
            self.token_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(OAuthToken { value: "fresh".to_string(), token_type: "Bearer".to_string(), expires_at: Utc::now() + FALLBACK_LIFETIME })
        }
        async fn send(&self, token: &OAuthToken, _request: &VendorRequest) -> Result<serde_json::Value, BrokerError> {
            if token.value == "stale" && self.failed_once.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(BrokerError::RequestError { code: "EGW00121".to_string(), message: "token expired".to_string() });
            }
            Ok(serde_json::json!({ "buying_power": 10_000 }))
        }
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once_and_the_retry_succeeds() {
        let gw = BrokerGateway::new(
            AuthExpiredOnceTransport { token_fetches: AtomicU32::new(0), failed_once: AtomicU32::new(0) },
            RateLimiter::new(ratelimit::RateLimitConfig::kr_exchange_default()),
            Arc::new(MultiTierCache::new(100, TtlTable::default_table())),
            "account:acct-1:",
        );
        // Pre-seed a token the gateway still considers usable by its own
        // clock, but that the vendor has already expired server-side.
        *gw.token.lock().await = Some(OAuthToken { value: "stale".to_string(), token_type: "Bearer".to_string(), expires_at: Utc::now() + FALLBACK_LIFETIME });

        let result = gw.execute(VendorRequest::get("get_account", "/account"), None, false).await;

        assert!(result.is_ok());
        assert_eq!(gw.transport.token_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_the_network() {
        let gw = gateway(0);
        gw.cache.set("price:005930", serde_json::json!({"price": 1})).await;
        let result = gw.execute(VendorRequest::get("get_ticker", "/ticker"), Some("price:005930".to_string()), false).await.unwrap();
        assert_eq!(result, serde_json::json!({"price": 1}));
    }
}
