use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{AnalysisResult, AnalystKind, PartialTradingState, Signal, TradingState};
use engine::Node;
use serde::Deserialize;

use crate::llm::{Llm, LlmMessage};

/// Cap on `AnalysisResult.signals`; an analyst's scalar readings are a
/// small closed map, not a free-form object.
pub const MAX_SIGNALS: usize = 10;

const LLM_TIMEOUT: Duration = Duration::from_secs(30);
const LLM_MAX_TOKENS: u32 = 1024;
const LLM_TEMPERATURE: f64 = 0.2;

#[derive(Debug, Deserialize)]
struct LlmAnalysisPayload {
    signal: Signal,
    confidence: f64,
    summary: String,
    #[serde(default)]
    key_factors: Vec<String>,
    #[serde(default)]
    signals: HashMap<String, serde_json::Value>,
}

/// One analyst stage. Reads `state.market_data` and prior analyses, asks
/// the LLM for a stage-specific read, and appends the parsed result to
/// `state.analyses` keyed by `kind`. A malformed or failed LLM response
/// never fails the node: it degrades to `AnalysisResult::failed` and
/// records the failure under `state.errors`.
pub struct AnalystNode {
    kind: AnalystKind,
    name: String,
    llm: Arc<dyn Llm>,
    system_prompt: String,
}

impl AnalystNode {
    pub fn new(kind: AnalystKind, llm: Arc<dyn Llm>, system_prompt: impl Into<String>) -> Self {
        Self { kind, name: format!("analyst_{kind}"), llm, system_prompt: system_prompt.into() }
    }

    fn node_name(&self) -> &str {
        &self.name
    }

    fn build_user_message(&self, state: &TradingState) -> String {
        serde_json::json!({
            "market_data": state.market_data,
            "prior_analyses": state.analyses,
        })
        .to_string()
    }

    fn parse(raw: &str) -> Option<AnalysisResult> {
        let payload: LlmAnalysisPayload = serde_json::from_str(raw).ok()?;
        let mut signals = payload.signals;
        if signals.len() > MAX_SIGNALS {
            signals = signals.into_iter().take(MAX_SIGNALS).collect();
        }
        Some(AnalysisResult::new(payload.signal, payload.confidence, payload.summary, payload.key_factors, raw, signals))
    }
}

#[async_trait]
impl Node for AnalystNode {
    fn name(&self) -> &str {
        self.node_name()
    }

    async fn run(&self, state: &TradingState) -> anyhow::Result<PartialTradingState> {
        let name = self.node_name().to_string();
        let messages = vec![LlmMessage::system(&self.system_prompt), LlmMessage::user(self.build_user_message(state))];

        let (result, failed) = match self.llm.complete(messages, LLM_TEMPERATURE, LLM_MAX_TOKENS, LLM_TIMEOUT).await {
            Ok(raw) => match Self::parse(&raw) {
                Some(result) => (result, false),
                None => {
                    tracing::warn!(node = %name, "llm response did not parse, recording HOLD");
                    (AnalysisResult::failed(raw), true)
                }
            },
            Err(e) => {
                tracing::warn!(node = %name, error = %e, "llm call failed, recording HOLD");
                (AnalysisResult::failed(e.to_string()), true)
            }
        };

        let mut partial = PartialTradingState::default().reasoning(format!("{name}: {:?} ({:.2})", result.signal, result.confidence()));
        partial.analyses.insert(self.kind, result);
        if failed {
            partial.errors.insert(name, "llm call failed or returned an unparseable response".to_string());
        }
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlm;

    #[tokio::test]
    async fn well_formed_response_is_parsed_and_recorded() {
        let response = serde_json::json!({
            "signal": "BUY",
            "confidence": 0.9,
            "summary": "bullish momentum",
            "key_factors": ["macd_cross", "volume_spike"],
            "signals": {"rsi": 65.0},
        })
        .to_string();
        let node = AnalystNode::new(AnalystKind::Technical, Arc::new(MockLlm::always(response)), "be a technical analyst");

        let partial = node.run(&TradingState::new()).await.unwrap();
        let result = partial.analyses.get(&AnalystKind::Technical).unwrap();
        assert_eq!(result.signal, Signal::Buy);
        assert_eq!(result.confidence(), 0.9);
        assert!(partial.errors.is_empty());
    }

    #[tokio::test]
    async fn llm_failure_degrades_to_hold_and_records_the_error() {
        let node = AnalystNode::new(AnalystKind::Risk, Arc::new(crate::llm::mock::FailingLlm), "be a risk analyst");
        let partial = node.run(&TradingState::new()).await.unwrap();
        let result = partial.analyses.get(&AnalystKind::Risk).unwrap();
        assert_eq!(result.signal, Signal::Hold);
        assert_eq!(result.confidence(), 0.0);
        assert_eq!(partial.errors.len(), 1);
    }

    #[tokio::test]
    async fn a_genuine_zero_confidence_hold_is_not_recorded_as_a_failure() {
        let response = serde_json::json!({
            "signal": "HOLD",
            "confidence": 0.0,
            "summary": "no conviction either way",
            "key_factors": [],
            "signals": {},
        })
        .to_string();
        let node = AnalystNode::new(AnalystKind::Risk, Arc::new(MockLlm::always(response)), "be a risk analyst");
        let partial = node.run(&TradingState::new()).await.unwrap();
        let result = partial.analyses.get(&AnalystKind::Risk).unwrap();
        assert_eq!(result.signal, Signal::Hold);
        assert_eq!(result.confidence(), 0.0);
        assert!(partial.errors.is_empty());
    }

    #[tokio::test]
    async fn unparseable_response_degrades_to_hold() {
        let node = AnalystNode::new(AnalystKind::Sentiment, Arc::new(MockLlm::always("not json")), "be a sentiment analyst");
        let partial = node.run(&TradingState::new()).await.unwrap();
        let result = partial.analyses.get(&AnalystKind::Sentiment).unwrap();
        assert_eq!(result.signal, Signal::Hold);
    }

    #[tokio::test]
    async fn signals_map_is_capped() {
        let mut signals = serde_json::Map::new();
        for i in 0..(MAX_SIGNALS + 5) {
            signals.insert(format!("s{i}"), serde_json::json!(i));
        }
        let response = serde_json::json!({
            "signal": "HOLD",
            "confidence": 0.5,
            "summary": "s",
            "key_factors": [],
            "signals": signals,
        })
        .to_string();
        let node = AnalystNode::new(AnalystKind::Market, Arc::new(MockLlm::always(response)), "be a market analyst");
        let partial = node.run(&TradingState::new()).await.unwrap();
        let result = partial.analyses.get(&AnalystKind::Market).unwrap();
        assert!(result.signals.len() <= MAX_SIGNALS);
    }
}
