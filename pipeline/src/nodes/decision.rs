use async_trait::async_trait;
use chrono::Utc;
use domain::{AnalystKind, Instrument, PartialTradingState, Signal, TradeAction, TradeProposal, TradingState};
use engine::Node;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::order::{price_to_tick_units, validate_price_tick};

pub const NODE_NAME: &str = "decision";

/// Position size cap as a fraction of buying power (spec's "position-size
/// cap" enforcement point). Conservative default; callers building the
/// graph for a real account should tune this from configuration.
pub const DEFAULT_MAX_POSITION_PCT: f64 = 0.1;

/// Synthesizes the collected analyses into a `TradeProposal`, enforcing
/// the position-size cap and tick-size validity before it is ever shown
/// to a human for approval.
pub struct DecisionNode {
    instrument: Instrument,
    market: domain::MarketKind,
    max_position_pct: f64,
}

impl DecisionNode {
    pub fn new(instrument: Instrument, market: domain::MarketKind) -> Self {
        Self { instrument, market, max_position_pct: DEFAULT_MAX_POSITION_PCT }
    }

    pub fn with_max_position_pct(mut self, pct: f64) -> Self {
        self.max_position_pct = pct;
        self
    }

    fn aggregate_signal(state: &TradingState) -> (TradeAction, f64) {
        if state.analyses.is_empty() {
            return (TradeAction::Hold, 0.0);
        }
        let mut score = 0.0;
        for result in state.analyses.values() {
            let weight = match result.signal {
                Signal::StrongBuy => 2.0,
                Signal::Buy => 1.0,
                Signal::Hold => 0.0,
                Signal::Sell => -1.0,
                Signal::StrongSell => -2.0,
            };
            score += weight * result.confidence();
        }
        let avg = score / state.analyses.len() as f64;
        let action = if avg > 0.5 {
            TradeAction::Buy
        } else if avg < -0.5 {
            TradeAction::Sell
        } else {
            TradeAction::Hold
        };
        (action, avg.abs().min(1.0))
    }

    fn cases(state: &TradingState) -> (String, String) {
        let mut bull = Vec::new();
        let mut bear = Vec::new();
        for (kind, result) in &state.analyses {
            match result.signal {
                Signal::Buy | Signal::StrongBuy => bull.push(format!("{kind}: {}", result.summary)),
                Signal::Sell | Signal::StrongSell => bear.push(format!("{kind}: {}", result.summary)),
                Signal::Hold => {}
            }
        }
        (bull.join("; "), bear.join("; "))
    }
}

#[async_trait]
impl Node for DecisionNode {
    fn name(&self) -> &str {
        NODE_NAME
    }

    async fn run(&self, state: &TradingState) -> anyhow::Result<PartialTradingState> {
        let (action, risk_score) = Self::aggregate_signal(state);

        if matches!(action, TradeAction::Hold) {
            // Still produces a proposal — `awaiting_approval = true` holds
            // only together with a non-null proposal (spec §8) — just one
            // with no position change for a human to approve or reject.
            let (bull_case, bear_case) = Self::cases(state);
            let analyst_names: Vec<String> = state.analyses.keys().map(|k: &AnalystKind| k.to_string()).collect();
            let proposal = TradeProposal {
                id: Uuid::new_v4(),
                instrument: self.instrument.clone(),
                action: TradeAction::Hold,
                quantity: 0.0,
                entry_price: state.market_data.ticker.as_ref().map(|t| t.price),
                stop_loss: None,
                take_profit: None,
                risk_score,
                position_size_pct: 0.0,
                rationale: format!("aggregated {} analyst signal(s) from [{}]; no actionable signal", state.analyses.len(), analyst_names.join(", ")),
                bull_case,
                bear_case,
                created_at: Utc::now(),
            };
            let mut partial = PartialTradingState::default().stage(domain::Stage::Decision).reasoning("decision: no actionable signal, holding");
            partial.trade_proposal = Some(proposal);
            return Ok(partial);
        }

        let buying_power = state.market_data.account.as_ref().map(|a| a.buying_power).unwrap_or(0.0);

        let Some(entry_price) = state.market_data.ticker.as_ref().map(|t| t.price) else {
            return Err(PipelineError::Validation("no ticker price available to size a proposal".to_string()).into());
        };

        let position_value = buying_power * self.max_position_pct;
        let quantity = if entry_price > 0.0 { position_value / entry_price } else { 0.0 };
        if quantity <= 0.0 {
            return Err(PipelineError::Validation("sized quantity is non-positive".to_string()).into());
        }

        let units = price_to_tick_units(self.market, entry_price);
        validate_price_tick(self.market, units).map_err(PipelineError::Validation)?;

        let (bull_case, bear_case) = Self::cases(state);
        let analyst_names: Vec<String> = state.analyses.keys().map(|k: &AnalystKind| k.to_string()).collect();

        let proposal = TradeProposal {
            id: Uuid::new_v4(),
            instrument: self.instrument.clone(),
            action,
            quantity,
            entry_price: Some(entry_price),
            stop_loss: None,
            take_profit: None,
            risk_score,
            position_size_pct: self.max_position_pct,
            rationale: format!("aggregated {} analyst signal(s) from [{}]", state.analyses.len(), analyst_names.join(", ")),
            bull_case,
            bear_case,
            created_at: Utc::now(),
        };

        let mut partial = PartialTradingState::default()
            .stage(domain::Stage::Decision)
            .reasoning(format!("decision: proposing {:?} x{:.4}", proposal.action, proposal.quantity));
        partial.trade_proposal = Some(proposal);
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{AccountContext, AnalysisResult, MarketDataSnapshot, MarketKind, Ticker};
    use std::collections::HashMap;

    fn state_with(signal: Signal, confidence: f64) -> TradingState {
        let mut state = TradingState::new();
        state.analyses.insert(AnalystKind::Technical, AnalysisResult::new(signal, confidence, "s", vec![], "r", HashMap::new()));
        state.market_data = MarketDataSnapshot {
            ticker: Some(Ticker { price: 100.0, volume: 1.0, ts_ms: 0 }),
            account: Some(AccountContext { buying_power: 10_000.0, positions: vec![] }),
            ..Default::default()
        };
        state
    }

    fn node() -> DecisionNode {
        DecisionNode::new(Instrument::Equity { symbol: "AAPL".to_string() }, MarketKind::UsEquity)
    }

    #[tokio::test]
    async fn strong_buy_signal_produces_a_buy_proposal() {
        let state = state_with(Signal::StrongBuy, 0.9);
        let partial = node().run(&state).await.unwrap();
        let proposal = partial.trade_proposal.unwrap();
        assert_eq!(proposal.action, TradeAction::Buy);
        assert!(proposal.quantity > 0.0);
    }

    #[tokio::test]
    async fn hold_signal_produces_a_hold_proposal_not_no_proposal() {
        let state = state_with(Signal::Hold, 0.9);
        let partial = node().run(&state).await.unwrap();
        let proposal = partial.trade_proposal.unwrap();
        assert_eq!(proposal.action, TradeAction::Hold);
        assert_eq!(proposal.quantity, 0.0);
    }

    #[tokio::test]
    async fn missing_ticker_is_a_validation_error() {
        let mut state = state_with(Signal::StrongBuy, 0.9);
        state.market_data.ticker = None;
        let result = node().run(&state).await;
        assert!(result.is_err());
    }
}
