use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::CheckpointError;
use crate::model::{Checkpoint, CheckpointMetadata};
use crate::store::CheckpointStore;

/// Sqlite-backed checkpoint store. `checkpoints_latest` holds the current
/// pointer per `(session_id, thread_id)` and is upserted atomically;
/// `checkpoint_history` is append-only and backs `list`.
pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn new(database_url: &str) -> Result<Self, CheckpointError> {
        let pool = SqlitePool::connect(database_url).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints_latest (
                session_id TEXT NOT NULL,
                thread_id TEXT NOT NULL,
                checkpoint_json TEXT NOT NULL,
                PRIMARY KEY (session_id, thread_id)
            );
        "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoint_history (
                session_id TEXT NOT NULL,
                thread_id TEXT NOT NULL,
                checkpoint_id TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                checkpoint_json TEXT NOT NULL
            );
        "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    fn deserialize(raw: &str, session_id: Uuid, thread_id: Uuid) -> Option<Checkpoint> {
        match serde_json::from_str(raw) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                tracing::warn!(%session_id, %thread_id, error = %e, "corrupt checkpoint entry, treating as miss");
                None
            }
        }
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn put(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointError> {
        let json = serde_json::to_string(checkpoint)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO checkpoints_latest (session_id, thread_id, checkpoint_json)
            VALUES (?, ?, ?)
            ON CONFLICT(session_id, thread_id) DO UPDATE SET
                checkpoint_json = excluded.checkpoint_json;
        "#,
        )
        .bind(session_id.to_string())
        .bind(thread_id.to_string())
        .bind(&json)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO checkpoint_history (session_id, thread_id, checkpoint_id, timestamp_ms, checkpoint_json)
            VALUES (?, ?, ?, ?, ?);
        "#,
        )
        .bind(session_id.to_string())
        .bind(thread_id.to_string())
        .bind(checkpoint.id.to_string())
        .bind(checkpoint.timestamp.timestamp_millis())
        .bind(&json)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_latest(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
    ) -> Result<Option<Checkpoint>, CheckpointError> {
        let row = sqlx::query(
            "SELECT checkpoint_json FROM checkpoints_latest WHERE session_id = ? AND thread_id = ?",
        )
        .bind(session_id.to_string())
        .bind(thread_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|row| {
            let raw: String = row.get("checkpoint_json");
            Self::deserialize(&raw, session_id, thread_id)
        }))
    }

    async fn list(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Checkpoint>, CheckpointError> {
        let limit = limit.unwrap_or(50);
        let rows = sqlx::query(
            r#"
            SELECT checkpoint_json FROM checkpoint_history
            WHERE session_id = ? AND thread_id = ?
            ORDER BY timestamp_ms DESC
            LIMIT ?
        "#,
        )
        .bind(session_id.to_string())
        .bind(thread_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let raw: String = row.get("checkpoint_json");
                Self::deserialize(&raw, session_id, thread_id)
            })
            .collect())
    }

    async fn put_writes(
        &self,
        session_id: Uuid,
        thread_id: Uuid,
        writes: serde_json::Value,
    ) -> Result<(), CheckpointError> {
        let Some(mut latest) = self.get_latest(session_id, thread_id).await? else {
            return Ok(());
        };
        latest.metadata = CheckpointMetadata { writes, ..latest.metadata };
        self.put(session_id, thread_id, &latest).await
    }
}
