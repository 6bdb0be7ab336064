use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::instrument::{Instrument, MarketKind};

pub type SessionId = Uuid;
pub type ThreadId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Running,
    AwaitingApproval,
    Completed,
    Cancelled,
    Error,
}

impl SessionStatus {
    /// Finished sessions become eligible for TTL-based sweeping.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Error
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub thread_id: ThreadId,
    pub instrument: Instrument,
    pub market_type: MarketKind,
    pub display_name: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl Session {
    pub fn new(instrument: Instrument, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        let session_id = Uuid::new_v4();
        Self {
            session_id,
            // thread_id equals session_id by default; multi-thread is
            // permitted by the checkpoint key alone.
            thread_id: session_id,
            market_type: instrument.market_kind(),
            instrument,
            display_name: display_name.into(),
            status: SessionStatus::Running,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }

    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.status.is_finished() && now - self.updated_at >= ttl
    }
}
