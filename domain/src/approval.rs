use serde::{Deserialize, Serialize};

use crate::proposal::ProposalOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Modified,
}

/// The payload a caller submits to resume a session parked at the
/// `approval` interrupt barrier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub status: ApprovalStatus,
    pub user_feedback: Option<String>,
    pub overrides: Option<ProposalOverrides>,
}
