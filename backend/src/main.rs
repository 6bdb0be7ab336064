use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use backend::broker_adapter::BrokerAdapter;
use backend::config::AppConfig;
use backend::logger::init_tracing;
use broker::{BrokerGateway, Credentials, GatewayRegistry, HttpVendorTransport};
use calendar::{Calendar, CalendarTable, HolidaySource, spawn_refresh_task};
use cache::{MultiTierCache, SqliteCacheTier, TtlTable};
use checkpoint::{CheckpointStore, SqliteCheckpointStore};
use domain::{Instrument, MarketKind};
use engine::Driver;
use pipeline::{AnalystPrompts, BrokerClient, Llm, LlmMessage};
use ratelimit::RateLimiter;
use realtime::{RealtimeHub, UpstreamFeed};
use session::SessionRegistry;
use tokio::sync::mpsc;

/// Placeholder holiday source. The real feed is an external collaborator
/// (spec §1, news/telemetry adapters); until one is wired up, the
/// calendar keeps whatever table it started with and logs the attempt.
struct UnconfiguredHolidaySource;

#[async_trait]
impl HolidaySource for UnconfiguredHolidaySource {
    async fn fetch_holidays(&self) -> anyhow::Result<Vec<chrono::NaiveDate>> {
        anyhow::bail!("no holiday source configured")
    }
}

/// Placeholder upstream market-data feed. Real implementation is a vendor
/// websocket client (external collaborator, out of scope); this one never
/// produces events, so `RealtimeHub` stays up but idle until a concrete
/// feed is wired in.
struct UnconfiguredUpstreamFeed;

#[async_trait]
impl UpstreamFeed for UnconfiguredUpstreamFeed {
    async fn subscribe(&self, _market: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn unsubscribe(&self, _market: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn run(&self, _events: mpsc::Sender<realtime::UpstreamEvent>) -> anyhow::Result<()> {
        std::future::pending().await
    }
}

/// Placeholder LLM client. No concrete provider ships with this system
/// (spec §13); a real client reads `cfg.llm` and implements this trait.
struct UnconfiguredLlm;

#[async_trait]
impl Llm for UnconfiguredLlm {
    async fn complete(
        &self,
        _messages: Vec<LlmMessage>,
        _temperature: f64,
        _max_tokens: u32,
        _timeout: std::time::Duration,
    ) -> anyhow::Result<String> {
        anyhow::bail!("no LLM provider configured")
    }

    async fn health(&self) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("no LLM provider configured")
    }
}

fn build_gateway(
    venue: &backend::config::VenueConfig,
    rate_limit: ratelimit::RateLimitConfig,
    cache: Arc<MultiTierCache>,
    retry: broker::RetryPolicy,
    account_prefix: &str,
) -> anyhow::Result<BrokerGateway<HttpVendorTransport>> {
    let transport = HttpVendorTransport::new(
        venue.base_url.clone(),
        venue.token_path.clone(),
        Credentials { client_id: venue.client_id.clone(), client_secret: venue.client_secret.clone() },
    )?;
    Ok(BrokerGateway::new(transport, RateLimiter::new(rate_limit), cache, account_prefix).with_retry(retry))
}

/// Builds the compiled pipeline for every market kind, sharing one broker
/// client per venue and one LLM client across all three. `pipeline`
/// doesn't vary analyst prompt text by market (out of scope, spec
/// Non-goals), so every graph gets the structural default.
fn build_graphs(
    llm: Arc<dyn Llm>,
    broker_kr: Arc<dyn BrokerClient>,
    broker_us: Arc<dyn BrokerClient>,
) -> anyhow::Result<HashMap<MarketKind, Arc<engine::GraphSpec>>> {
    let mut graphs = HashMap::new();

    let us_instrument = Instrument::Equity { symbol: "AAPL".to_string() };
    graphs.insert(
        MarketKind::UsEquity,
        Arc::new(pipeline::build_graph(us_instrument, MarketKind::UsEquity, llm.clone(), broker_us, AnalystPrompts::new())?),
    );

    let kr_instrument = Instrument::KrEquity { code: "005930".to_string() };
    graphs.insert(
        MarketKind::KrEquity,
        Arc::new(pipeline::build_graph(kr_instrument, MarketKind::KrEquity, llm.clone(), broker_kr.clone(), AnalystPrompts::new())?),
    );

    let crypto_instrument = Instrument::Crypto { market: "KRW-BTC".to_string() };
    graphs.insert(
        MarketKind::Crypto,
        Arc::new(pipeline::build_graph(crypto_instrument, MarketKind::Crypto, llm, broker_kr, AnalystPrompts::new())?),
    );

    Ok(graphs)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("starting analysis session orchestrator");

    let cfg = AppConfig::from_env();

    let checkpoints: Arc<dyn CheckpointStore> = Arc::new(SqliteCheckpointStore::new(&cfg.database_url).await?);

    let cache_l3 = SqliteCacheTier::new(&cfg.database_url).await?;
    let cache = Arc::new(MultiTierCache::new(cfg.cache.l1_capacity, TtlTable::default_table()).with_l3(Arc::new(cache_l3)));

    let gateway_registry_kr: GatewayRegistry<HttpVendorTransport> = GatewayRegistry::new();
    let gateway_registry_us: GatewayRegistry<HttpVendorTransport> = GatewayRegistry::new();
    let retry = cfg.retry.to_policy();

    let gateway_kr = gateway_registry_kr
        .get_or_create("kr-primary", || {
            build_gateway(&cfg.venue_kr, cfg.rate_limits_kr, cache.clone(), retry, "account:kr-primary:")
                .expect("KR venue gateway must construct from valid config")
        })
        .await;
    let gateway_us = gateway_registry_us
        .get_or_create("us-primary", || {
            build_gateway(&cfg.venue_us, cfg.rate_limits_us, cache.clone(), retry, "account:us-primary:")
                .expect("US venue gateway must construct from valid config")
        })
        .await;

    let broker_kr: Arc<dyn BrokerClient> = Arc::new(BrokerAdapter::new(gateway_kr));
    let broker_us: Arc<dyn BrokerClient> = Arc::new(BrokerAdapter::new(gateway_us));

    let llm: Arc<dyn Llm> = Arc::new(UnconfiguredLlm);

    let graphs = build_graphs(llm, broker_kr, broker_us)?;

    let sessions = SessionRegistry::new(cfg.max_concurrent_analyses, cfg.completed_session_ttl);
    let _cleanup_task = sessions.clone().spawn_cleanup_task(cfg.cleanup_interval);

    let drivers: HashMap<MarketKind, Arc<Driver>> = graphs
        .into_iter()
        .map(|(kind, graph)| (kind, Arc::new(Driver::new(graph, checkpoints.clone(), sessions.clone()))))
        .collect();
    tracing::info!(market_kinds = drivers.len(), "compiled analysis graphs ready");

    let calendar = Calendar::new(CalendarTable::new(std::iter::empty()));
    let holiday_source: Arc<dyn HolidaySource> = Arc::new(UnconfiguredHolidaySource);
    let _calendar_refresh = spawn_refresh_task(calendar, holiday_source, cfg.calendar_refresh_period);

    let upstream_feed: Arc<dyn UpstreamFeed> = Arc::new(UnconfiguredUpstreamFeed);
    let _realtime_hub = RealtimeHub::spawn(upstream_feed);

    tracing::info!("orchestrator started; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    Ok(())
}
