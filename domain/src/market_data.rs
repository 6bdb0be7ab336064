use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candle {
    pub ts_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderbookLevel {
    pub price: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Orderbook {
    pub bids: Vec<OrderbookLevel>,
    pub asks: Vec<OrderbookLevel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ticker {
    pub price: f64,
    pub volume: f64,
    pub ts_ms: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountContext {
    pub buying_power: f64,
    pub positions: Vec<(String, f64)>,
}

/// Provider snapshot collected by the `data_collection` node. `partial`
/// is set whenever one of the underlying broker calls failed and the
/// snapshot has to be treated as incomplete by downstream nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketDataSnapshot {
    pub candles: Vec<Candle>,
    pub orderbook: Option<Orderbook>,
    pub ticker: Option<Ticker>,
    pub account: Option<AccountContext>,
    pub partial: bool,
}
