use std::time::Duration;

use broker::RetryPolicy;
use ratelimit::RateLimitConfig;

/// One venue's connection details: where its REST API lives and which
/// credentials to present. `base_url`/`token_path` are vendor-specific but
/// the shape this config exposes isn't — both the Korean and US gateways
/// read from the same struct.
#[derive(Clone, Debug)]
pub struct VenueConfig {
    pub base_url: String,
    pub token_path: String,
    pub client_id: String,
    pub client_secret: String,
}

impl VenueConfig {
    fn from_env(prefix: &str, default_base_url: &str) -> Self {
        Self {
            base_url: std::env::var(format!("{prefix}_BASE_URL")).unwrap_or_else(|_| default_base_url.to_string()),
            token_path: std::env::var(format!("{prefix}_TOKEN_PATH")).unwrap_or_else(|_| "/oauth2/token".to_string()),
            client_id: std::env::var(format!("{prefix}_CLIENT_ID")).unwrap_or_default(),
            client_secret: std::env::var(format!("{prefix}_CLIENT_SECRET")).unwrap_or_default(),
        }
    }
}

/// The LLM provider knobs spec §6 mentions; no concrete client ships here
/// (out of scope), but a future one reads its endpoint/model/timeout from
/// this struct the same way the venue gateways read `VenueConfig`.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl LlmConfig {
    fn from_env() -> Self {
        Self {
            base_url: std::env::var("LLM_BASE_URL").unwrap_or_default(),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(30),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub l1_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy { base: self.base, cap: self.cap, max_attempts: self.max_attempts }
    }
}

/// Every knob spec §6 names, loaded `from_env` in the same style as the
/// teacher's `AppConfig::from_env`: an explicit env var with a sane
/// default, no config file parsing.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,

    /// Admission cap on concurrently running analysis sessions (C8).
    pub max_concurrent_analyses: usize,

    /// TTL before a finished session becomes eligible for cleanup (C8).
    pub completed_session_ttl: chrono::Duration,
    pub cleanup_interval: Duration,

    pub llm: LlmConfig,
    pub venue_kr: VenueConfig,
    pub venue_us: VenueConfig,

    pub rate_limits_kr: RateLimitConfig,
    pub rate_limits_us: RateLimitConfig,

    pub cache: CacheConfig,
    pub retry: RetryConfig,

    /// Node names the engine pauses before, handed to the pipeline's
    /// graph builder. Spec only names `approval`; additional entries are
    /// accepted so an operator can widen the interrupt set without a
    /// code change.
    pub hitl_interrupt_before: Vec<String>,

    pub calendar_refresh_period: Duration,
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://orchestrator.db".to_string());

        Self {
            database_url,

            max_concurrent_analyses: env_usize("MAX_CONCURRENT_ANALYSES", 10),

            completed_session_ttl: chrono::Duration::hours(env_u64("COMPLETED_SESSION_TTL_HOURS", 24) as i64),
            cleanup_interval: Duration::from_secs(env_u64("SESSION_CLEANUP_INTERVAL_SECS", 5 * 60)),

            llm: LlmConfig::from_env(),
            venue_kr: VenueConfig::from_env("VENUE_KR", "https://api.kr-broker.example"),
            venue_us: VenueConfig::from_env("VENUE_US", "https://api.us-broker.example"),

            rate_limits_kr: RateLimitConfig::kr_exchange_default(),
            rate_limits_us: RateLimitConfig::kr_exchange_default(),

            cache: CacheConfig { l1_capacity: env_usize("CACHE_L1_CAPACITY", 10_000) },

            retry: RetryConfig {
                base: Duration::from_secs(env_u64("RETRY_BASE_SECS", 2)),
                cap: Duration::from_secs(env_u64("RETRY_CAP_SECS", 10)),
                max_attempts: env_usize("RETRY_MAX_ATTEMPTS", 3) as u32,
            },

            hitl_interrupt_before: vec!["approval".to_string()],

            calendar_refresh_period: Duration::from_secs(24 * 60 * 60),
        }
    }
}
