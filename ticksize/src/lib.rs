pub mod error;
pub mod table;

pub use error::TickSizeError;
pub use table::{RoundMode, Side, TickTable};

use domain::MarketKind;

/// The tick table a given market kind trades under.
pub fn table_for(market: MarketKind) -> TickTable {
    match market {
        MarketKind::UsEquity => TickTable::us_equity(),
        MarketKind::KrEquity => TickTable::kr_equity(),
        MarketKind::Crypto => TickTable::kr_crypto(),
    }
}
