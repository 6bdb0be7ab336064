use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CheckpointError;
use crate::model::Checkpoint;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Durably store `checkpoint` as the latest for `(session_id, thread_id)`,
    /// overwriting whatever was previously the latest pointer.
    async fn put(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointError>;

    async fn get_latest(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
    ) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Returns checkpoints newest-first. A store may legally return just
    /// the latest regardless of `limit`.
    async fn list(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Checkpoint>, CheckpointError>;

    /// Attach pending intermediate writes to the current latest checkpoint
    /// for `(session_id, thread_id)`, merging into its metadata.
    async fn put_writes(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
        writes: serde_json::Value,
    ) -> Result<(), CheckpointError>;
}
