use crate::error::TickSizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    Nearest,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Ordered `(upper_exclusive_price, tick)` bands, terminated implicitly by
/// a sentinel band matching all higher prices. Prices are integer venue
/// units: KRW for the Korean-exchange tables, cents for US equities.
#[derive(Debug, Clone)]
pub struct TickTable {
    bands: Vec<(i64, i64)>,
    sentinel_tick: i64,
}

impl TickTable {
    pub fn new(mut bands: Vec<(i64, i64)>, sentinel_tick: i64) -> Self {
        bands.sort_by_key(|(upper, _)| *upper);
        Self { bands, sentinel_tick }
    }

    /// The Korean-exchange bracket table from spec §4.2.
    pub fn kr_equity() -> Self {
        Self::new(
            vec![
                (1_000, 1),
                (5_000, 5),
                (10_000, 10),
                (50_000, 50),
                (100_000, 100),
                (500_000, 500),
            ],
            1_000,
        )
    }

    /// The Korean won-denominated crypto venue uses the same bracket table.
    pub fn kr_crypto() -> Self {
        Self::kr_equity()
    }

    /// US equities: a flat one-cent tick, expressed as 1 unit where the
    /// unit is a cent (spec's integer tick API has no native concept of
    /// fractional-dollar prices, so callers work in cents for this table).
    pub fn us_equity() -> Self {
        Self::new(Vec::new(), 1)
    }

    pub fn tick_of(&self, price: i64) -> Result<i64, TickSizeError> {
        if price < 0 {
            return Err(TickSizeError::NegativePrice(price));
        }
        for (upper, tick) in &self.bands {
            if price < *upper {
                return Ok(*tick);
            }
        }
        Ok(self.sentinel_tick)
    }

    pub fn round(&self, price: i64, mode: RoundMode) -> Result<i64, TickSizeError> {
        let tick = self.tick_of(price)?;
        let rem = price.rem_euclid(tick);
        let base = price - rem;
        Ok(match mode {
            RoundMode::Down => base,
            RoundMode::Up => {
                if rem == 0 {
                    base
                } else {
                    base + tick
                }
            }
            RoundMode::Nearest => {
                if rem * 2 >= tick {
                    base + tick
                } else {
                    base
                }
            }
        })
    }

    pub fn is_valid(&self, price: i64) -> Result<bool, TickSizeError> {
        let tick = self.tick_of(price)?;
        Ok(price.rem_euclid(tick) == 0)
    }

    /// Apply a signed percentage adjustment, then round Up for a buy
    /// (pay no less than the adjusted price) or Down for a sell (receive
    /// no more than the adjusted price).
    pub fn slippage(&self, price: i64, pct: f64, side: Side) -> Result<i64, TickSizeError> {
        if price < 0 {
            return Err(TickSizeError::NegativePrice(price));
        }
        let adjusted = match side {
            Side::Buy => price as f64 * (1.0 + pct / 100.0),
            Side::Sell => price as f64 * (1.0 - pct / 100.0),
        };
        let rounded_to_unit = adjusted.round().max(0.0) as i64;
        let mode = match side {
            Side::Buy => RoundMode::Up,
            Side::Sell => RoundMode::Down,
        };
        self.round(rounded_to_unit, mode)
    }
}
