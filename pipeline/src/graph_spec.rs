use std::collections::HashMap;
use std::sync::Arc;

use domain::{AnalystKind, ApprovalStatus, Instrument, MarketKind, MAX_REANALYZE_RETRIES};
use engine::{GraphSpecBuilder, Node, END_NODE};

use crate::broker_client::BrokerClient;
use crate::llm::Llm;
use crate::nodes::{AnalystNode, ApprovalNode, DataCollectionNode, DecisionNode, ExecuteNode, ReAnalyzeNode};

pub const APPROVAL_NODE: &str = "approval";

/// Per-analyst-kind system prompt text. Prompt content itself is out of
/// scope; callers that care about wording supply it here, and any kind
/// left unset gets a minimal structural placeholder.
pub type AnalystPrompts = HashMap<AnalystKind, String>;

fn default_prompt(kind: AnalystKind) -> String {
    format!("You are the {kind} analyst for this trading session.")
}

/// Builds the compiled pipeline for one market kind, wiring every node
/// named in the node contract and the single conditional edge at
/// `approval`. The analyst stage sequence is `market.analyst_stages()`,
/// per spec.
pub fn build_graph(
    instrument: Instrument,
    market: MarketKind,
    llm: Arc<dyn Llm>,
    broker: Arc<dyn BrokerClient>,
    prompts: AnalystPrompts,
) -> anyhow::Result<engine::GraphSpec> {
    let stages = market.analyst_stages();
    if stages.is_empty() {
        anyhow::bail!("market kind {market} declares no analyst stages");
    }

    let mut builder = GraphSpecBuilder::new()
        .start(crate::nodes::data_collection::NODE_NAME)
        .node(Arc::new(DataCollectionNode::new(broker.clone(), instrument.clone())))
        .node(Arc::new(DecisionNode::new(instrument.clone(), market)))
        .node(Arc::new(ApprovalNode))
        .node(Arc::new(ReAnalyzeNode))
        .node(Arc::new(ExecuteNode::new(broker.clone(), market)))
        .interrupt_before(APPROVAL_NODE);

    let mut previous = crate::nodes::data_collection::NODE_NAME.to_string();
    for &kind in stages {
        let prompt = prompts.get(&kind).cloned().unwrap_or_else(|| default_prompt(kind));
        let node = Arc::new(AnalystNode::new(kind, llm.clone(), prompt));
        let name = node.name().to_string();
        builder = builder.node(node).edge(previous, name.clone());
        previous = name;
    }

    let graph = builder
        .edge(previous, crate::nodes::decision::NODE_NAME)
        .edge(crate::nodes::decision::NODE_NAME, APPROVAL_NODE)
        .edge(crate::nodes::re_analyze::NODE_NAME, crate::nodes::data_collection::NODE_NAME)
        .edge(crate::nodes::execute::NODE_NAME, END_NODE)
        .conditional(APPROVAL_NODE, |state| match state.approval_status {
            ApprovalStatus::Approved | ApprovalStatus::Modified => crate::nodes::execute::NODE_NAME.to_string(),
            ApprovalStatus::Rejected => {
                // Would the retry this re_analyze performs reach the cap?
                // Check against the count *after* that retry, not the
                // count as it stands now, or the cap lets one rejection
                // too many through before terminating.
                if state.retry_count + 1 >= MAX_REANALYZE_RETRIES {
                    END_NODE.to_string()
                } else {
                    crate::nodes::re_analyze::NODE_NAME.to_string()
                }
            }
            ApprovalStatus::Pending => END_NODE.to_string(),
        })
        .build()?;

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlm;
    use domain::{AccountContext, Candle, ExecutionResult, Orderbook, Ticker};
    use async_trait::async_trait;

    struct NoopBroker;

    #[async_trait]
    impl BrokerClient for NoopBroker {
        async fn candles(&self, _i: &Instrument, _l: usize) -> anyhow::Result<Vec<Candle>> {
            Ok(vec![])
        }
        async fn ticker(&self, _i: &Instrument) -> anyhow::Result<Ticker> {
            Ok(Ticker::default())
        }
        async fn orderbook(&self, _i: &Instrument) -> anyhow::Result<Orderbook> {
            Ok(Orderbook::default())
        }
        async fn account(&self) -> anyhow::Result<AccountContext> {
            Ok(AccountContext::default())
        }
        async fn submit_order(&self, _order: &crate::broker_client::OrderRequest) -> anyhow::Result<String> {
            Ok("order-1".to_string())
        }
        async fn order_status(&self, _order_id: &str) -> anyhow::Result<ExecutionResult> {
            Ok(ExecutionResult { order_id: None, status: "FILLED".to_string(), filled_quantity: 1.0, avg_fill_price: None, raw: serde_json::Value::Null })
        }
    }

    #[test]
    fn graph_wires_every_contract_node_for_each_market_kind() {
        for market in [MarketKind::UsEquity, MarketKind::KrEquity, MarketKind::Crypto] {
            let instrument = match market {
                MarketKind::UsEquity => Instrument::Equity { symbol: "AAPL".to_string() },
                MarketKind::KrEquity => Instrument::KrEquity { code: "005930".to_string() },
                MarketKind::Crypto => Instrument::Crypto { market: "KRW-BTC".to_string() },
            };
            let graph = build_graph(
                instrument,
                market,
                Arc::new(MockLlm::always("{}")),
                Arc::new(NoopBroker),
                AnalystPrompts::new(),
            )
            .unwrap();

            assert_eq!(graph.start, crate::nodes::data_collection::NODE_NAME);
            assert!(graph.interrupt_before.contains(APPROVAL_NODE));
            assert_eq!(graph.nodes.len(), 5 + market.analyst_stages().len());
        }
    }
}
