use domain::{ApprovalDecision, ApprovalStatus, PartialTradingState, TradingState};

/// Builds the resume-time update payload from a caller's approval
/// decision. The `approval` node itself writes no state; this is the
/// state change that actually takes effect when a caller resumes an
/// interrupted session, per the driver contract. `Modified` applies the
/// declared field overrides to the checkpointed proposal before the
/// conditional edge routes to `execute`.
pub fn build_resume_update(checkpointed_state: &TradingState, decision: ApprovalDecision) -> anyhow::Result<PartialTradingState> {
    let mut partial = PartialTradingState::default();
    partial.approval_status = Some(decision.status);
    partial.user_feedback = decision.user_feedback;

    if matches!(decision.status, ApprovalStatus::Modified) {
        let mut proposal = checkpointed_state
            .trade_proposal
            .clone()
            .ok_or_else(|| anyhow::anyhow!("modified approval decision but no checkpointed proposal"))?;
        if let Some(overrides) = &decision.overrides {
            proposal.apply_overrides(overrides);
        }
        partial.trade_proposal = Some(proposal);
    }

    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Instrument, ProposalOverrides, TradeAction, TradeProposal};
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

    #[test]
    fn approved_decision_just_sets_the_status() {
        let mut state = TradingState::new();
        state.trade_proposal = Some(proposal());
        let decision = ApprovalDecision { status: ApprovalStatus::Approved, user_feedback: None, overrides: None };
        let partial = build_resume_update(&state, decision).unwrap();
        assert_eq!(partial.approval_status, Some(ApprovalStatus::Approved));
        assert!(partial.trade_proposal.is_none());
    }

    #[test]
    fn modified_decision_applies_overrides_to_the_checkpointed_proposal() {
        let mut state = TradingState::new();
        state.trade_proposal = Some(proposal());
        let decision = ApprovalDecision {
            status: ApprovalStatus::Modified,
            user_feedback: Some("smaller size".to_string()),
            overrides: Some(ProposalOverrides { quantity: Some(0.5), stop_loss: Some(90.0), take_profit: None }),
        };
        let partial = build_resume_update(&state, decision).unwrap();
        let proposal = partial.trade_proposal.unwrap();
        assert_eq!(proposal.quantity, 0.5);
        assert_eq!(proposal.stop_loss, Some(90.0));
    }

    #[test]
    fn modified_decision_without_a_checkpointed_proposal_errors() {
        let state = TradingState::new();
        let decision = ApprovalDecision { status: ApprovalStatus::Modified, user_feedback: None, overrides: None };
        assert!(build_resume_update(&state, decision).is_err());
    }
}
