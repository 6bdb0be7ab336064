use domain::{AccountContext, MarketKind, TradeAction, TradeProposal};
use ticksize::table_for;

/// Converts a decimal price into the integer venue units the tick table
/// speaks: cents for US equities, whole won for Korean equities/crypto.
pub fn price_to_tick_units(market: MarketKind, price: f64) -> i64 {
    match market {
        MarketKind::UsEquity => (price * 100.0).round() as i64,
        MarketKind::KrEquity | MarketKind::Crypto => price.round() as i64,
    }
}

pub fn validate_price_tick(market: MarketKind, units: i64) -> Result<(), String> {
    let table = table_for(market);
    match table.is_valid(units) {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("price {units} is not tick-aligned for {market}")),
        Err(e) => Err(e.to_string()),
    }
}

/// Re-validates a proposal immediately before submission: quantity,
/// price tick, and balance. Run again here (decision already checked
/// tick alignment and sizing) because a `Modified` approval can change
/// quantity/price after `decision` ran and before `execute` does.
pub fn validate_order(proposal: &TradeProposal, market: MarketKind, account: Option<&AccountContext>) -> Result<(), String> {
    if proposal.quantity <= 0.0 {
        return Err("order quantity must be positive".to_string());
    }

    if let Some(price) = proposal.entry_price {
        let units = price_to_tick_units(market, price);
        validate_price_tick(market, units)?;
    }

    if matches!(proposal.action, TradeAction::Buy) {
        let Some(account) = account else {
            return Err("no account context available to validate balance".to_string());
        };
        let price = proposal.entry_price.unwrap_or(0.0);
        let notional = proposal.quantity * price;
        if notional > account.buying_power {
            return Err(format!("order notional {notional:.2} exceeds buying power {:.2}", account.buying_power));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_equity_price_converts_to_cents() {
        assert_eq!(price_to_tick_units(MarketKind::UsEquity, 123.45), 12345);
    }

    #[test]
    fn kr_equity_price_is_already_integer_units() {
        assert_eq!(price_to_tick_units(MarketKind::KrEquity, 70000.0), 70000);
    }

    #[test]
    fn misaligned_price_is_rejected() {
        // KRW band above 50,000 ticks in 100s.
        assert!(validate_price_tick(MarketKind::KrEquity, 70_050).is_err());
        assert!(validate_price_tick(MarketKind::KrEquity, 70_100).is_ok());
    }

    #[test]
    fn order_exceeding_buying_power_is_rejected() {
        let proposal = TradeProposal {
            id: uuid::Uuid::new_v4(),
            instrument: domain::Instrument::Equity { symbol: "AAPL".to_string() },
            action: TradeAction::Buy,
            quantity: 1000.0,
            entry_price: Some(100.0),
            stop_loss: None,
            take_profit: None,
            risk_score: 0.5,
            position_size_pct: 0.1,
            rationale: "r".to_string(),
            bull_case: String::new(),
            bear_case: String::new(),
            created_at: chrono::Utc::now(),
        };
        let account = AccountContext { buying_power: 1000.0, positions: vec![] };
        assert!(validate_order(&proposal, MarketKind::UsEquity, Some(&account)).is_err());
    }
}
