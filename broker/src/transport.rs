use async_trait::async_trait;

use crate::error::BrokerError;
use crate::token::OAuthToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct VendorRequest {
    pub api_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl VendorRequest {
    pub fn get(api_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self { api_id: api_id.into(), method: HttpMethod::Get, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn post(api_id: impl Into<String>, path: impl Into<String>, body: serde_json::Value) -> Self {
        Self { api_id: api_id.into(), method: HttpMethod::Post, path: path.into(), query: Vec::new(), body: Some(body) }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// The vendor-specific transport a `BrokerGateway` drives. A concrete
/// implementation owns the actual HTTP client and endpoint map; this
/// trait is the seam that lets the gateway's cache/rate-limit/retry
/// pipeline stay vendor-agnostic, the same way `UpstreamFeed` isolates
/// realtime from its websocket vendor.
#[async_trait]
pub trait VendorTransport: Send + Sync {
    /// Exchange account credentials for a fresh token. Implementations
    /// classify failures per spec §4.5: a vendor auth-class rejection is
    /// `BrokerError::Auth` (fatal), anything else is `BrokerError::Network`
    /// (retryable).
    async fn fetch_token(&self) -> Result<OAuthToken, BrokerError>;

    /// Send one request, bearer-authenticated with `token`. Transport
    /// failures map to `BrokerError::Network`; non-2xx responses map to
    /// `BrokerError::RequestError` with the vendor code preserved.
    async fn send(&self, token: &OAuthToken, request: &VendorRequest) -> Result<serde_json::Value, BrokerError>;
}
