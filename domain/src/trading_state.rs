use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::approval::ApprovalStatus;
use crate::execution_result::ExecutionResult;
use crate::instrument::AnalystKind;
use crate::market_data::MarketDataSnapshot;
use crate::proposal::TradeProposal;

/// Current position in the compiled pipeline (spec §4.9's node graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Start,
    DataCollection,
    Analyst(AnalystKind),
    Decision,
    Approval,
    Execute,
    ReAnalyze,
    End,
}

impl Stage {
    /// The node name as it appears in `hitl.interrupt_before` config and in
    /// logs — distinct analyst stages are distinct node names.
    pub fn node_name(&self) -> String {
        match self {
            Stage::Start => "start".to_string(),
            Stage::DataCollection => "data_collection".to_string(),
            Stage::Analyst(k) => format!("analyst_{k}"),
            Stage::Decision => "decision".to_string(),
            Stage::Approval => "approval".to_string(),
            Stage::Execute => "execute".to_string(),
            Stage::ReAnalyze => "re_analyze".to_string(),
            Stage::End => "end".to_string(),
        }
    }
}

/// Last-N-retained ring buffer for the human-readable trail of what was
/// attempted and what failed (spec §7).
pub const REASONING_LOG_CAP: usize = 200;

/// Cap on `re_analyze` loop iterations before routing unconditionally to
/// `end` (spec §4.10).
pub const MAX_REANALYZE_RETRIES: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingState {
    pub stage: Stage,
    pub market_data: MarketDataSnapshot,
    pub analyses: HashMap<AnalystKind, AnalysisResult>,
    pub trade_proposal: Option<TradeProposal>,
    pub approval_status: ApprovalStatus,
    pub user_feedback: Option<String>,
    pub awaiting_approval: bool,
    pub execution_status: Option<String>,
    pub execution_result: Option<ExecutionResult>,
    pub reasoning_log: VecDeque<String>,
    pub retry_count: u32,
    /// Soft-failure flags keyed by node name (`data_collection`, or an
    /// analyst kind's display name).
    pub errors: HashMap<String, String>,
}

impl TradingState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Start,
            market_data: MarketDataSnapshot::default(),
            analyses: HashMap::new(),
            trade_proposal: None,
            approval_status: ApprovalStatus::Pending,
            user_feedback: None,
            awaiting_approval: false,
            execution_status: None,
            execution_result: None,
            reasoning_log: VecDeque::new(),
            retry_count: 0,
            errors: HashMap::new(),
        }
    }

    pub fn push_reasoning(&mut self, line: impl Into<String>) {
        self.reasoning_log.push_back(line.into());
        while self.reasoning_log.len() > REASONING_LOG_CAP {
            self.reasoning_log.pop_front();
        }
    }

    /// `awaiting_approval = true` iff the pipeline has produced a proposal
    /// and not yet consumed an approval decision (spec §3 invariant).
    pub fn invariant_awaiting_approval_consistent(&self) -> bool {
        self.awaiting_approval == (self.stage == Stage::Approval && self.trade_proposal.is_some())
    }

    /// Apply a node's partial output using the documented merge rule:
    /// scalar fields overwrite, `reasoning_log` is append-only,
    /// `analyses` is a keyed merge.
    pub fn merge(&mut self, partial: PartialTradingState) {
        if let Some(stage) = partial.stage {
            self.stage = stage;
        }
        if let Some(md) = partial.market_data {
            self.market_data = md;
        }
        if partial.clear_analyses {
            self.analyses.clear();
        }
        for (k, v) in partial.analyses {
            self.analyses.insert(k, v);
        }
        if partial.clear_trade_proposal {
            self.trade_proposal = None;
        }
        if let Some(p) = partial.trade_proposal {
            self.trade_proposal = Some(p);
        }
        if let Some(s) = partial.approval_status {
            self.approval_status = s;
        }
        if partial.user_feedback.is_some() {
            self.user_feedback = partial.user_feedback;
        }
        if let Some(a) = partial.awaiting_approval {
            self.awaiting_approval = a;
        }
        if partial.execution_status.is_some() {
            self.execution_status = partial.execution_status;
        }
        if partial.execution_result.is_some() {
            self.execution_result = partial.execution_result;
        }
        for line in partial.reasoning_log {
            self.push_reasoning(line);
        }
        if let Some(rc) = partial.retry_count {
            self.retry_count = rc;
        }
        for (k, v) in partial.errors {
            self.errors.insert(k, v);
        }
    }
}

impl Default for TradingState {
    fn default() -> Self {
        Self::new()
    }
}

/// A node's output before it is merged into `TradingState`. Every field is
/// additive-or-absent except the two explicit `clear_*` flags, which exist
/// because `re_analyze` must be able to wipe prior analyses/proposal
/// rather than merely leaving them unset.
#[derive(Debug, Clone, Default)]
pub struct PartialTradingState {
    pub stage: Option<Stage>,
    pub market_data: Option<MarketDataSnapshot>,
    pub analyses: HashMap<AnalystKind, AnalysisResult>,
    pub clear_analyses: bool,
    pub trade_proposal: Option<TradeProposal>,
    pub clear_trade_proposal: bool,
    pub approval_status: Option<ApprovalStatus>,
    pub user_feedback: Option<String>,
    pub awaiting_approval: Option<bool>,
    pub execution_status: Option<String>,
    pub execution_result: Option<ExecutionResult>,
    pub reasoning_log: Vec<String>,
    pub retry_count: Option<u32>,
    pub errors: HashMap<String, String>,
}

impl PartialTradingState {
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn reasoning(mut self, line: impl Into<String>) -> Self {
        self.reasoning_log.push(line.into());
        self
    }
}
