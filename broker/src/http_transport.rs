use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::error::BrokerError;
use crate::token::{FALLBACK_LIFETIME, OAuthToken};
use crate::transport::{HttpMethod, VendorRequest, VendorTransport};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct VendorErrorBody {
    #[serde(alias = "error_code", alias = "rt_cd")]
    code: String,
    #[serde(alias = "error_message", alias = "msg1", default)]
    message: String,
}

/// Generic REST transport shared by the KR and US vendor gateways, built
/// the same way `StonfiClient` builds its HTTP client: short timeout,
/// idle-connection reuse, TCP keepalive.
pub struct HttpVendorTransport {
    http: Client,
    base_url: String,
    token_path: String,
    credentials: Credentials,
}

impl HttpVendorTransport {
    pub fn new(base_url: String, token_path: String, credentials: Credentials) -> Result<Self, BrokerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| BrokerError::Internal(e.to_string()))?;

        Ok(Self { http, base_url, token_path, credentials })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl VendorTransport for HttpVendorTransport {
    async fn fetch_token(&self) -> Result<OAuthToken, BrokerError> {
        let resp = self
            .http
            .post(self.url(&self.token_path))
            .json(&serde_json::json!({
                "grant_type": "client_credentials",
                "appkey": self.credentials.client_id,
                "appsecret": self.credentials.client_secret,
            }))
            .send()
            .await
            .map_err(|e| BrokerError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body: Option<VendorErrorBody> = resp.json().await.ok();
            return Err(classify_token_failure(status.as_u16(), body));
        }

        let parsed: TokenResponse = resp.json().await.map_err(|e| BrokerError::Network(e.to_string()))?;

        let expires_at = parsed
            .expires_at
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| parsed.expires_in.map(|secs| Utc::now() + chrono::Duration::seconds(secs)))
            .unwrap_or_else(|| Utc::now() + FALLBACK_LIFETIME);

        Ok(OAuthToken {
            value: parsed.access_token,
            token_type: parsed.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at,
        })
    }

    async fn send(&self, token: &OAuthToken, request: &VendorRequest) -> Result<serde_json::Value, BrokerError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(self.url(&request.path)),
            HttpMethod::Post => self.http.post(self.url(&request.path)),
        };
        builder = builder.bearer_auth(&token.value);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| BrokerError::Network(e.to_string()))?;

        if resp.status().is_success() {
            resp.json().await.map_err(|e| BrokerError::Network(e.to_string()))
        } else {
            let status = resp.status().as_u16();
            let body: Option<VendorErrorBody> = resp.json().await.ok();
            Err(match body {
                Some(b) => BrokerError::RequestError { code: b.code, message: b.message },
                None => BrokerError::RequestError { code: status.to_string(), message: "no vendor body".to_string() },
            })
        }
    }
}

fn classify_token_failure(status: u16, body: Option<VendorErrorBody>) -> BrokerError {
    match body {
        Some(b) if crate::vendor_error::is_credential_invalid(&b.code) => BrokerError::Auth(b.message),
        Some(b) => BrokerError::Network(format!("token endpoint returned {status}: {}", b.message)),
        None => BrokerError::Network(format!("token endpoint returned {status}")),
    }
}
