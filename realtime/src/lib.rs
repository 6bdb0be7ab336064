pub mod hub;
pub mod types;
pub mod upstream;

pub use hub::{RealtimeHub, SubscriberId};
pub use types::{MarketKey, Trade, TradeSide, UpstreamEvent};
pub use upstream::UpstreamFeed;
