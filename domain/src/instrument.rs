use serde::{Deserialize, Serialize};

/// The three market kinds this system trades. Each instrument carries the
/// venue-native code for its own market (`"AAPL"`, `"005930"`, `"KRW-BTC"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Instrument {
    Equity { symbol: String },
    KrEquity { code: String },
    Crypto { market: String },
}

impl Instrument {
    pub fn market_kind(&self) -> MarketKind {
        match self {
            Instrument::Equity { .. } => MarketKind::UsEquity,
            Instrument::KrEquity { .. } => MarketKind::KrEquity,
            Instrument::Crypto { .. } => MarketKind::Crypto,
        }
    }

    /// The opaque venue-native code carried by this instrument.
    pub fn venue_code(&self) -> &str {
        match self {
            Instrument::Equity { symbol } => symbol,
            Instrument::KrEquity { code } => code,
            Instrument::Crypto { market } => market,
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.market_kind(), self.venue_code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    UsEquity,
    KrEquity,
    Crypto,
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarketKind::UsEquity => "us_equity",
            MarketKind::KrEquity => "kr_equity",
            MarketKind::Crypto => "crypto",
        };
        f.write_str(s)
    }
}

/// One analyst stage in the pipeline. Which subset runs, and in what order,
/// is determined by `MarketKind::analyst_stages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalystKind {
    Technical,
    Fundamental,
    Market,
    Sentiment,
    Risk,
}

impl std::fmt::Display for AnalystKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnalystKind::Technical => "technical",
            AnalystKind::Fundamental => "fundamental",
            AnalystKind::Market => "market",
            AnalystKind::Sentiment => "sentiment",
            AnalystKind::Risk => "risk",
        };
        f.write_str(s)
    }
}

impl MarketKind {
    /// Sequential analyst stages for this market, in pipeline order.
    pub fn analyst_stages(&self) -> &'static [AnalystKind] {
        use AnalystKind::*;
        match self {
            MarketKind::UsEquity => &[Technical, Fundamental, Sentiment, Risk],
            MarketKind::KrEquity => &[Technical, Market, Sentiment, Risk],
            MarketKind::Crypto => &[Technical, Fundamental, Sentiment, Risk],
        }
    }
}
