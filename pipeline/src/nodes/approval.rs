use async_trait::async_trait;
use domain::{PartialTradingState, TradingState};
use engine::Node;

pub const NODE_NAME: &str = "approval";

/// The interrupt barrier. Writes no state itself: per the driver
/// contract, `approval` is always listed in `interrupt_before`, so the
/// engine never actually calls `run` on it in the normal flow — it's
/// present so the graph has a named node to route to and checkpoint
/// against. If it is ever reached without a proposal, that is an
/// invariant violation the caller should treat as `Internal`.
pub struct ApprovalNode;

#[async_trait]
impl Node for ApprovalNode {
    fn name(&self) -> &str {
        NODE_NAME
    }

    async fn run(&self, state: &TradingState) -> anyhow::Result<PartialTradingState> {
        if state.trade_proposal.is_none() {
            anyhow::bail!("interrupt reached approval with no proposal");
        }
        Ok(PartialTradingState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Instrument, TradeAction, TradeProposal};
    use uuid::Uuid;

    fn proposal() -> TradeProposal {
        TradeProposal {
            id: Uuid::new_v4(),
            instrument: Instrument::Equity { symbol: "AAPL".to_string() },
            action: TradeAction::Buy,
            quantity: 1.0,
            entry_price: Some(100.0),
            stop_loss: None,
            take_profit: None,
            risk_score: 0.5,
            position_size_pct: 0.1,
            rationale: String::new(),
            bull_case: String::new(),
            bear_case: String::new(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn writes_no_state_when_a_proposal_is_present() {
        let mut state = TradingState::new();
        state.trade_proposal = Some(proposal());
        let partial = ApprovalNode.run(&state).await.unwrap();
        assert!(partial.stage.is_none());
        assert!(partial.trade_proposal.is_none());
    }

    #[tokio::test]
    async fn no_proposal_is_an_invariant_violation() {
        let state = TradingState::new();
        assert!(ApprovalNode.run(&state).await.is_err());
    }
}
