use std::sync::Arc;

use async_trait::async_trait;
use domain::{MarketDataSnapshot, PartialTradingState, TradingState};
use engine::Node;

use crate::broker_client::BrokerClient;

pub const NODE_NAME: &str = "data_collection";

/// Lookback window (in candles) fetched for the analyst stages.
pub const DEFAULT_LOOKBACK: usize = 200;

/// Populates `state.market_data` from the broker. Fails soft: a failed
/// underlying call drops that field and sets `partial`, which later
/// analyst nodes consume rather than treating as fatal.
pub struct DataCollectionNode {
    broker: Arc<dyn BrokerClient>,
    instrument: domain::Instrument,
    lookback: usize,
}

impl DataCollectionNode {
    pub fn new(broker: Arc<dyn BrokerClient>, instrument: domain::Instrument) -> Self {
        Self { broker, instrument, lookback: DEFAULT_LOOKBACK }
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }
}

#[async_trait]
impl Node for DataCollectionNode {
    fn name(&self) -> &str {
        NODE_NAME
    }

    async fn run(&self, _state: &TradingState) -> anyhow::Result<PartialTradingState> {
        let mut snapshot = MarketDataSnapshot::default();
        let mut partial_data = false;

        match self.broker.candles(&self.instrument, self.lookback).await {
            Ok(candles) => snapshot.candles = candles,
            Err(e) => {
                tracing::warn!(error = %e, "candle fetch failed, continuing with partial data");
                partial_data = true;
            }
        }

        match self.broker.ticker(&self.instrument).await {
            Ok(ticker) => snapshot.ticker = Some(ticker),
            Err(e) => {
                tracing::warn!(error = %e, "ticker fetch failed, continuing with partial data");
                partial_data = true;
            }
        }

        match self.broker.orderbook(&self.instrument).await {
            Ok(orderbook) => snapshot.orderbook = Some(orderbook),
            Err(e) => {
                tracing::warn!(error = %e, "orderbook fetch failed, continuing with partial data");
                partial_data = true;
            }
        }

        match self.broker.account().await {
            Ok(account) => snapshot.account = Some(account),
            Err(e) => {
                tracing::warn!(error = %e, "account fetch failed, continuing with partial data");
                partial_data = true;
            }
        }

        snapshot.partial = partial_data;

        let mut partial = PartialTradingState::default().reasoning(if partial_data {
            "data_collection: partial market data"
        } else {
            "data_collection: collected market data"
        });
        partial.market_data = Some(snapshot);
        if partial_data {
            partial.errors.insert(NODE_NAME.to_string(), "one or more broker calls failed".to_string());
        }
        Ok(partial)
    }
}
