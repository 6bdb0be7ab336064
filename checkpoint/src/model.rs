use chrono::{DateTime, Utc};
use domain::TradingState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata describing why a checkpoint was written, mirroring LangGraph's
/// `source`/`step`/`writes` triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: String,
    pub step: i64,
    /// Pending intermediate writes attached by `put_writes`, carried as an
    /// opaque, never-interpreted JSON value.
    pub writes: serde_json::Value,
}

impl Default for CheckpointMetadata {
    fn default() -> Self {
        Self { source: "engine".to_string(), step: 0, writes: serde_json::Value::Null }
    }
}

/// One durable snapshot of a session's `TradingState`, keyed by
/// `(session_id, thread_id)` in the store. `pending_sends` is carried as an
/// opaque `serde_json::Value` and never interpreted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: i64,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub channel_values: TradingState,
    pub channel_versions: serde_json::Value,
    pub pending_sends: serde_json::Value,
    pub metadata: CheckpointMetadata,
    pub parent_id: Option<Uuid>,
}

impl Checkpoint {
    pub fn new(channel_values: TradingState, metadata: CheckpointMetadata, parent_id: Option<Uuid>) -> Self {
        Self {
            version: 1,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            channel_values,
            channel_versions: serde_json::Value::Null,
            pending_sends: serde_json::Value::Null,
            metadata,
            parent_id,
        }
    }
}
