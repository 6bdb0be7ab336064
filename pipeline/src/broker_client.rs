use async_trait::async_trait;
use domain::{AccountContext, Candle, ExecutionResult, Instrument, Orderbook, Ticker, TradeAction};

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub instrument: Instrument,
    pub action: TradeAction,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Client-generated idempotency key so a retried submit never double-fills.
    pub client_order_id: String,
}

/// The few semantic operations `execute`/`data_collection` need from a
/// broker. No concrete vendor implementation ships here (spec's external
/// interfaces are described only at the boundary); the composition root
/// adapts a concrete gateway (C5) to this trait.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn candles(&self, instrument: &Instrument, lookback: usize) -> anyhow::Result<Vec<Candle>>;
    async fn ticker(&self, instrument: &Instrument) -> anyhow::Result<Ticker>;
    async fn orderbook(&self, instrument: &Instrument) -> anyhow::Result<Orderbook>;
    async fn account(&self) -> anyhow::Result<AccountContext>;

    /// Submits `order` and returns the venue order id. The concrete
    /// implementation is responsible for idempotent-pre-send-only retry
    /// classing (C5); by the time this returns `Ok`, the order has either
    /// been accepted exactly once or this call has failed.
    async fn submit_order(&self, order: &OrderRequest) -> anyhow::Result<String>;

    async fn order_status(&self, order_id: &str) -> anyhow::Result<ExecutionResult>;
}
