use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::instrument::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeProposal {
    pub id: Uuid,
    pub instrument: Instrument,
    pub action: TradeAction,
    pub quantity: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub risk_score: f64,
    pub position_size_pct: f64,
    pub rationale: String,
    pub bull_case: String,
    pub bear_case: String,
    pub created_at: DateTime<Utc>,
}

/// Field overrides a `Modified` approval decision may apply to a proposal
/// before execution (spec §4.9's conditional-edge contract).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalOverrides {
    pub quantity: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl TradeProposal {
    pub fn apply_overrides(&mut self, overrides: &ProposalOverrides) {
        if let Some(q) = overrides.quantity {
            self.quantity = q;
        }
        if let Some(sl) = overrides.stop_loss {
            self.stop_loss = Some(sl);
        }
        if let Some(tp) = overrides.take_profit {
            self.take_profit = Some(tp);
        }
    }
}
