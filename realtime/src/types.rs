use domain::Ticker;
use serde::{Deserialize, Serialize};

/// Venue-native market identifier, e.g. `"005930"` or `"KRW-BTC"`.
pub type MarketKey = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    pub quantity: f64,
    pub side: TradeSide,
    pub ts_ms: i64,
}

/// An event pushed up from the single upstream subscription, tagged with
/// the market it belongs to so the hub can fan it out to the right subs.
#[derive(Debug, Clone)]
pub enum UpstreamEvent {
    Ticker { market: MarketKey, ticker: Ticker },
    Trade { market: MarketKey, trade: Trade },
}
