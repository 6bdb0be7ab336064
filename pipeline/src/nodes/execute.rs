use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{ApprovalStatus, ExecutionResult, MarketKind, PartialTradingState, TradeAction, TradingState};
use engine::Node;

use crate::broker_client::{BrokerClient, OrderRequest};
use crate::error::PipelineError;
use crate::order::validate_order;

pub const NODE_NAME: &str = "execute";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal order statuses; anything else keeps the poll loop going.
const TERMINAL_STATUSES: &[&str] = &["FILLED", "CANCELLED", "REJECTED"];

/// Given an `Approved` or `Modified` proposal, constructs an order,
/// re-validates it, submits it (idempotently, via the broker's own
/// pre-send-only retry classing), and polls status until terminal or
/// timeout. A timeout records the last-observed status rather than
/// failing the node: reconciliation is left to the caller via a later
/// status lookup, not retried here.
pub struct ExecuteNode {
    broker: Arc<dyn BrokerClient>,
    market: MarketKind,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl ExecuteNode {
    pub fn new(broker: Arc<dyn BrokerClient>, market: MarketKind) -> Self {
        Self { broker, market, poll_interval: DEFAULT_POLL_INTERVAL, poll_timeout: DEFAULT_POLL_TIMEOUT }
    }

    pub fn with_poll(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_timeout = timeout;
        self
    }
}

#[async_trait]
impl Node for ExecuteNode {
    fn name(&self) -> &str {
        NODE_NAME
    }

    async fn run(&self, state: &TradingState) -> anyhow::Result<PartialTradingState> {
        if !matches!(state.approval_status, ApprovalStatus::Approved | ApprovalStatus::Modified) {
            anyhow::bail!("execute reached without an approved or modified decision");
        }
        let proposal = state.trade_proposal.as_ref().ok_or_else(|| anyhow::anyhow!("execute reached with no proposal"))?;

        if matches!(proposal.action, TradeAction::Hold) {
            let mut partial = PartialTradingState::default().stage(domain::Stage::Execute).reasoning("execute: hold, no order placed");
            partial.execution_status = Some("HOLD_NO_ORDER".to_string());
            return Ok(partial);
        }

        validate_order(proposal, self.market, state.market_data.account.as_ref()).map_err(PipelineError::Validation)?;

        let order = OrderRequest {
            instrument: proposal.instrument.clone(),
            action: proposal.action,
            quantity: proposal.quantity,
            limit_price: proposal.entry_price,
            stop_loss: proposal.stop_loss,
            take_profit: proposal.take_profit,
            client_order_id: proposal.id.to_string(),
        };

        let order_id = self.broker.submit_order(&order).await.map_err(|e| PipelineError::Broker(e.to_string()))?;

        let deadline = tokio::time::Instant::now() + self.poll_timeout;
        let mut last = ExecutionResult {
            order_id: Some(order_id.clone()),
            status: "PENDING".to_string(),
            filled_quantity: 0.0,
            avg_fill_price: None,
            raw: serde_json::Value::Null,
        };

        loop {
            match self.broker.order_status(&order_id).await {
                Ok(result) => {
                    let terminal = TERMINAL_STATUSES.contains(&result.status.as_str());
                    last = result;
                    if terminal {
                        break;
                    }
                }
                Err(e) => tracing::warn!(order_id, error = %e, "order status poll failed, will retry"),
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(order_id, status = %last.status, "order status poll timed out, recording last observed state");
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let mut partial = PartialTradingState::default()
            .stage(domain::Stage::Execute)
            .reasoning(format!("execute: order {order_id} -> {}", last.status));
        partial.execution_status = Some(last.status.clone());
        partial.execution_result = Some(last);
        Ok(partial)
    }
}
