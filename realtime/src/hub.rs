use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use domain::Ticker;
use tokio::sync::{Mutex, mpsc};

use crate::types::{MarketKey, Trade, UpstreamEvent};
use crate::upstream::UpstreamFeed;

pub type SubscriberId = u64;

const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;
const RECONNECT_BASE: Duration = Duration::from_secs(1);
const RECONNECT_CAP: Duration = Duration::from_secs(30);

struct Subscribers<T> {
    by_market: HashMap<MarketKey, Vec<(SubscriberId, mpsc::Sender<T>)>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self { by_market: HashMap::new() }
    }
}

impl<T: Clone> Subscribers<T> {
    /// Returns `true` if this was the market's first subscriber.
    fn add(&mut self, market: &str, id: SubscriberId, sender: mpsc::Sender<T>) -> bool {
        let entry = self.by_market.entry(market.to_string()).or_default();
        let first = entry.is_empty();
        entry.push((id, sender));
        first
    }

    /// Returns `true` if the market has no subscribers left.
    fn remove(&mut self, market: &str, id: SubscriberId) -> bool {
        if let Some(entry) = self.by_market.get_mut(market) {
            entry.retain(|(sub_id, _)| *sub_id != id);
            if entry.is_empty() {
                self.by_market.remove(market);
                return true;
            }
        }
        false
    }

    /// Drops `id` from every market, returning the markets that became
    /// empty as a result.
    fn remove_everywhere(&mut self, id: SubscriberId) -> Vec<MarketKey> {
        let mut emptied = Vec::new();
        self.by_market.retain(|market, subs| {
            subs.retain(|(sub_id, _)| *sub_id != id);
            if subs.is_empty() {
                emptied.push(market.clone());
                false
            } else {
                true
            }
        });
        emptied
    }

    fn broadcast(&self, market: &str, value: &T) {
        if let Some(subs) = self.by_market.get(market) {
            for (_, sender) in subs {
                // Best-effort: a full or closed subscriber channel is
                // dropped silently rather than blocking the dispatch loop.
                let _ = sender.try_send(value.clone());
            }
        }
    }

    fn markets(&self) -> Vec<MarketKey> {
        self.by_market.keys().cloned().collect()
    }
}

/// Process-wide fan-out hub: one upstream subscription, many downstream
/// subscribers per market. Subscribe/unsubscribe commands reach the
/// upstream only on 0→1 / 1→0 transitions; a fresh subscriber gets the
/// last known ticker immediately if one is cached.
pub struct RealtimeHub {
    feed: Arc<dyn UpstreamFeed>,
    ticker_subs: Mutex<Subscribers<Ticker>>,
    trade_subs: Mutex<Subscribers<Trade>>,
    latest_ticker: Mutex<HashMap<MarketKey, Ticker>>,
    next_id: AtomicU64,
}

impl RealtimeHub {
    pub fn spawn(feed: Arc<dyn UpstreamFeed>) -> Arc<Self> {
        let hub = Arc::new(Self {
            feed,
            ticker_subs: Mutex::new(Subscribers::default()),
            trade_subs: Mutex::new(Subscribers::default()),
            latest_ticker: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        });

        let (events_tx, events_rx) = mpsc::channel(1024);
        tokio::spawn(Self::reconnect_loop(hub.clone(), events_tx));
        tokio::spawn(Self::dispatch_loop(hub.clone(), events_rx));
        hub
    }

    fn alloc_id(&self) -> SubscriberId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn active_markets(&self) -> Vec<MarketKey> {
        let mut markets = self.ticker_subs.lock().await.markets();
        markets.extend(self.trade_subs.lock().await.markets());
        markets.sort();
        markets.dedup();
        markets
    }

    pub async fn subscribe_ticker(&self, market: &str) -> (SubscriberId, mpsc::Receiver<Ticker>) {
        let id = self.alloc_id();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let first = self.ticker_subs.lock().await.add(market, id, tx.clone());
        if first {
            if let Err(e) = self.feed.subscribe(market).await {
                tracing::warn!(market, error = %e, "upstream ticker subscribe failed");
            }
        }
        if let Some(cached) = self.latest_ticker.lock().await.get(market) {
            let _ = tx.try_send(cached.clone());
        }
        (id, rx)
    }

    pub async fn subscribe_trade(&self, market: &str) -> (SubscriberId, mpsc::Receiver<Trade>) {
        let id = self.alloc_id();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let first = self.trade_subs.lock().await.add(market, id, tx);
        if first {
            if let Err(e) = self.feed.subscribe(market).await {
                tracing::warn!(market, error = %e, "upstream trade subscribe failed");
            }
        }
        (id, rx)
    }

    pub async fn unsubscribe_ticker(&self, market: &str, id: SubscriberId) {
        let emptied = self.ticker_subs.lock().await.remove(market, id);
        if emptied {
            if let Err(e) = self.feed.unsubscribe(market).await {
                tracing::warn!(market, error = %e, "upstream ticker unsubscribe failed");
            }
        }
    }

    pub async fn unsubscribe_trade(&self, market: &str, id: SubscriberId) {
        let emptied = self.trade_subs.lock().await.remove(market, id);
        if emptied {
            if let Err(e) = self.feed.unsubscribe(market).await {
                tracing::warn!(market, error = %e, "upstream trade unsubscribe failed");
            }
        }
    }

    /// Drop `id` from every market it's subscribed to across both ticker
    /// and trade feeds, unsubscribing upstream for any market this leaves
    /// with no subscribers at all.
    pub async fn unsubscribe_all(&self, id: SubscriberId) {
        let mut emptied = self.ticker_subs.lock().await.remove_everywhere(id);
        emptied.extend(self.trade_subs.lock().await.remove_everywhere(id));
        emptied.sort();
        emptied.dedup();
        for market in emptied {
            if let Err(e) = self.feed.unsubscribe(&market).await {
                tracing::warn!(market, error = %e, "upstream unsubscribe failed during sweep");
            }
        }
    }

    async fn dispatch_loop(hub: Arc<Self>, mut events: mpsc::Receiver<UpstreamEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                UpstreamEvent::Ticker { market, ticker } => {
                    hub.latest_ticker.lock().await.insert(market.clone(), ticker.clone());
                    hub.ticker_subs.lock().await.broadcast(&market, &ticker);
                }
                UpstreamEvent::Trade { market, trade } => {
                    hub.trade_subs.lock().await.broadcast(&market, &trade);
                }
            }
        }
    }

    async fn reconnect_loop(hub: Arc<Self>, events_tx: mpsc::Sender<UpstreamEvent>) {
        let mut backoff = RECONNECT_BASE;
        loop {
            match hub.feed.run(events_tx.clone()).await {
                Ok(()) => tracing::info!("upstream feed closed cleanly, reconnecting"),
                Err(e) => tracing::warn!(error = %e, "upstream feed disconnected, reconnecting"),
            }

            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(RECONNECT_CAP);

            for market in hub.active_markets().await {
                if let Err(e) = hub.feed.subscribe(&market).await {
                    tracing::warn!(market, error = %e, "resubscribe after reconnect failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    struct ScriptedFeed {
        runs: AtomicUsize,
        notify: Notify,
        subscribed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UpstreamFeed for ScriptedFeed {
        async fn subscribe(&self, market: &str) -> anyhow::Result<()> {
            self.subscribed.lock().await.push(market.to_string());
            Ok(())
        }
        async fn unsubscribe(&self, _market: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn run(&self, events: mpsc::Sender<UpstreamEvent>) -> anyhow::Result<()> {
            let run_no = self.runs.fetch_add(1, Ordering::SeqCst);
            if run_no == 0 {
                events
                    .send(UpstreamEvent::Ticker {
                        market: "005930".to_string(),
                        ticker: Ticker { price: 70000.0, volume: 1.0, ts_ms: 0 },
                    })
                    .await
                    .unwrap();
                anyhow::bail!("simulated disconnect");
            }
            self.notify.notified().await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_subscriber_gets_cached_snapshot_immediately() {
        let feed = Arc::new(ScriptedFeed {
            runs: AtomicUsize::new(0),
            notify: Notify::new(),
            subscribed: Mutex::new(Vec::new()),
        });
        let hub = RealtimeHub::spawn(feed.clone());

        let (_id, mut rx) = hub.subscribe_ticker("005930").await;
        let first = rx.recv().await.unwrap();
        assert_eq!(first.price, 70000.0);

        let (_id2, mut rx2) = hub.subscribe_ticker("005930").await;
        let cached = rx2.recv().await.unwrap();
        assert_eq!(cached.price, 70000.0);
    }

    #[tokio::test]
    async fn subscribe_unsubscribe_only_touches_upstream_on_transitions() {
        let subs = Arc::new(Mutex::new(Subscribers::<Ticker>::default()));
        let first = subs.lock().await.add("005930", 1, mpsc::channel(1).0);
        assert!(first);
        let second = subs.lock().await.add("005930", 2, mpsc::channel(1).0);
        assert!(!second);
        let emptied = subs.lock().await.remove("005930", 1);
        assert!(!emptied);
        let emptied = subs.lock().await.remove("005930", 2);
        assert!(emptied);
    }
}
