use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::gateway::BrokerGateway;
use crate::transport::VendorTransport;

/// One gateway instance per credential set, reused process-wide so rate
/// buckets and cache stay shared across every caller for that account.
/// Changing credentials calls `invalidate` first, forcing the next
/// `get_or_create` to rebuild.
pub struct GatewayRegistry<T: VendorTransport> {
    instances: Mutex<HashMap<String, Arc<BrokerGateway<T>>>>,
}

impl<T: VendorTransport> Default for GatewayRegistry<T> {
    fn default() -> Self {
        Self { instances: Mutex::new(HashMap::new()) }
    }
}

impl<T: VendorTransport> GatewayRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create<F>(&self, account_id: &str, build: F) -> Arc<BrokerGateway<T>>
    where
        F: FnOnce() -> BrokerGateway<T>,
    {
        let mut instances = self.instances.lock().await;
        if let Some(existing) = instances.get(account_id) {
            return existing.clone();
        }
        let gateway = Arc::new(build());
        instances.insert(account_id.to_string(), gateway.clone());
        gateway
    }

    pub async fn invalidate(&self, account_id: &str) {
        self.instances.lock().await.remove(account_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrokerError;
    use crate::token::{FALLBACK_LIFETIME, OAuthToken};
    use crate::transport::VendorRequest;
    use async_trait::async_trait;
    use cache::{MultiTierCache, TtlTable};
    use chrono::Utc;

    struct NoopTransport;

    #[async_trait]
    impl VendorTransport for NoopTransport {
        async fn fetch_token(&self) -> Result<OAuthToken, BrokerError> {
            Ok(OAuthToken { value: "t".to_string(), token_type: "Bearer".to_string(), expires_at: Utc::now() + FALLBACK_LIFETIME })
        }
        async fn send(&self, _token: &OAuthToken, _request: &VendorRequest) -> Result<serde_json::Value, BrokerError> {
            Ok(serde_json::json!({}))
        }
    }

    #[tokio::test]
    async fn same_account_reuses_the_same_instance() {
        let registry = GatewayRegistry::<NoopTransport>::new();
        let build = || {
            BrokerGateway::new(
                NoopTransport,
                ratelimit::RateLimiter::new(ratelimit::RateLimitConfig::kr_exchange_default()),
                Arc::new(MultiTierCache::new(10, TtlTable::default_table())),
                "account:acct-1:",
            )
        };
        let first = registry.get_or_create("acct-1", build).await;
        let second = registry.get_or_create("acct-1", build).await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn invalidate_forces_a_rebuild() {
        let registry = GatewayRegistry::<NoopTransport>::new();
        let build = || {
            BrokerGateway::new(
                NoopTransport,
                ratelimit::RateLimiter::new(ratelimit::RateLimitConfig::kr_exchange_default()),
                Arc::new(MultiTierCache::new(10, TtlTable::default_table())),
                "account:acct-1:",
            )
        };
        let first = registry.get_or_create("acct-1", build).await;
        registry.invalidate("acct-1").await;
        let second = registry.get_or_create("acct-1", build).await;
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
