use async_trait::async_trait;
use domain::{PartialTradingState, TradingState};
use engine::Node;

pub const NODE_NAME: &str = "re_analyze";

/// Clears `analyses` and `trade_proposal` and bumps the retry counter.
/// Whether the cap has been exceeded is decided at the `approval`
/// conditional edge (before this node is ever entered): a rejection where
/// this retry would reach `MAX_REANALYZE_RETRIES` routes straight to
/// `end` instead of here, so by the time `re_analyze` runs another
/// attempt is always permitted. The static edge back to `data_collection`
/// is unconditional.
pub struct ReAnalyzeNode;

#[async_trait]
impl Node for ReAnalyzeNode {
    fn name(&self) -> &str {
        NODE_NAME
    }

    async fn run(&self, state: &TradingState) -> anyhow::Result<PartialTradingState> {
        let mut partial = PartialTradingState::default()
            .stage(domain::Stage::ReAnalyze)
            .reasoning(format!("re_analyze: attempt {}", state.retry_count + 1));
        partial.clear_analyses = true;
        partial.clear_trade_proposal = true;
        partial.retry_count = Some(state.retry_count + 1);
        Ok(partial)
    }
}
