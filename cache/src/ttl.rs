use std::time::Duration;

/// Maps a cache key's prefix to its time-to-live. Checked longest-prefix
/// first so a more specific prefix (e.g. `"orderbook:KRX:"`) can override a
/// broader one (`"orderbook:"`).
#[derive(Debug, Clone)]
pub struct TtlTable {
    entries: Vec<(String, Duration)>,
    default_ttl: Duration,
}

impl TtlTable {
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: Vec::new(), default_ttl }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, ttl: Duration) -> Self {
        self.entries.push((prefix.into(), ttl));
        self.entries.sort_by_key(|(p, _)| std::cmp::Reverse(p.len()));
        self
    }

    pub fn ttl_for(&self, key: &str) -> Duration {
        self.entries
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix.as_str()))
            .map(|(_, ttl)| *ttl)
            .unwrap_or(self.default_ttl)
    }

    /// The prefix table from spec §4.4.
    pub fn default_table() -> Self {
        Self::new(Duration::from_secs(60))
            .with_prefix("price:", Duration::from_secs(3))
            .with_prefix("orderbook:", Duration::from_secs(2))
            .with_prefix("candles:daily:", Duration::from_secs(3600))
            .with_prefix("account:balance:", Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_matching_prefix_wins() {
        let table = TtlTable::default_table();
        assert_eq!(table.ttl_for("price:AAPL"), Duration::from_secs(3));
        assert_eq!(table.ttl_for("orderbook:005930"), Duration::from_secs(2));
        assert_eq!(table.ttl_for("candles:daily:AAPL"), Duration::from_secs(3600));
        assert_eq!(table.ttl_for("account:balance:acct-1"), Duration::from_secs(30));
    }

    #[test]
    fn unknown_prefix_falls_back_to_default() {
        let table = TtlTable::default_table();
        assert_eq!(table.ttl_for("something:else"), Duration::from_secs(60));
    }
}
