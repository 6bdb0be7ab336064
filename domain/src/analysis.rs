use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Closed signal vocabulary produced by an analyst stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

/// Cap on `key_factors`; analyst nodes truncate to this before constructing.
pub const MAX_KEY_FACTORS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub signal: Signal,
    confidence: f64,
    pub summary: String,
    pub key_factors: Vec<String>,
    pub raw_reasoning: String,
    /// Small open map of analyst-kind-specific scalar values (documented
    /// keys per analyst kind), not a free-form object.
    pub signals: HashMap<String, serde_json::Value>,
}

impl AnalysisResult {
    /// Construct a result, clamping confidence to `[0, 1]` and truncating
    /// `key_factors` to `MAX_KEY_FACTORS`, per the analyst node contract.
    pub fn new(
        signal: Signal,
        confidence: f64,
        summary: impl Into<String>,
        mut key_factors: Vec<String>,
        raw_reasoning: impl Into<String>,
        signals: HashMap<String, serde_json::Value>,
    ) -> Self {
        key_factors.truncate(MAX_KEY_FACTORS);
        Self {
            signal,
            confidence: confidence.clamp(0.0, 1.0),
            summary: summary.into(),
            key_factors,
            raw_reasoning: raw_reasoning.into(),
            signals,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// The result recorded when an analyst node fails to get a usable LLM
    /// response: HOLD, zero confidence, empty factors.
    pub fn failed(raw_reasoning: impl Into<String>) -> Self {
        Self::new(
            Signal::Hold,
            0.0,
            "analysis unavailable",
            Vec::new(),
            raw_reasoning,
            HashMap::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped_into_unit_interval() {
        let r = AnalysisResult::new(Signal::Buy, 1.7, "s", vec![], "r", HashMap::new());
        assert_eq!(r.confidence(), 1.0);
        let r = AnalysisResult::new(Signal::Buy, -0.3, "s", vec![], "r", HashMap::new());
        assert_eq!(r.confidence(), 0.0);
    }

    #[test]
    fn key_factors_are_truncated() {
        let factors = (0..10).map(|i| i.to_string()).collect();
        let r = AnalysisResult::new(Signal::Hold, 0.5, "s", factors, "r", HashMap::new());
        assert_eq!(r.key_factors.len(), MAX_KEY_FACTORS);
    }

    #[test]
    fn failed_result_is_hold_zero_confidence() {
        let r = AnalysisResult::failed("llm timeout");
        assert_eq!(r.signal, Signal::Hold);
        assert_eq!(r.confidence(), 0.0);
        assert!(r.key_factors.is_empty());
    }
}
