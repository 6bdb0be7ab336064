use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::{MarketKey, UpstreamEvent};

/// The single external market-data connection this process maintains. A
/// concrete implementation owns the actual websocket (out of scope here —
/// vendor feeds are external collaborators); this trait is the seam the
/// hub drives it through.
#[async_trait]
pub trait UpstreamFeed: Send + Sync {
    /// Ask the upstream to start streaming `market`. Called only on a
    /// 0→1 subscriber transition for that market.
    async fn subscribe(&self, market: &str) -> anyhow::Result<()>;

    /// Ask the upstream to stop streaming `market`. Called only on a
    /// 1→0 subscriber transition.
    async fn unsubscribe(&self, market: &str) -> anyhow::Result<()>;

    /// Run the receive loop, pushing events into `events` until the
    /// connection drops. Returning `Err` (or `Ok` on a clean remote close)
    /// signals the driver to reconnect.
    async fn run(&self, events: mpsc::Sender<UpstreamEvent>) -> anyhow::Result<()>;
}
