use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::tier::CacheTier;

/// Durable L3 tier backed by sqlite, mirroring the checkpoint store's
/// schema-on-connect and upsert conventions.
pub struct SqliteCacheTier {
    pool: SqlitePool,
}

impl SqliteCacheTier {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL,
                expires_at_ms INTEGER NOT NULL
            );
        "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CacheTier for SqliteCacheTier {
    async fn get(&self, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT value_json, expires_at_ms FROM cache_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let expires_at_ms: i64 = row.get("expires_at_ms");
        if expires_at_ms <= common::clock::now_ms() {
            sqlx::query("DELETE FROM cache_entries WHERE key = ?")
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let value_json: String = row.get("value_json");
        match serde_json::from_str(&value_json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt cache entry, treating as miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> anyhow::Result<()> {
        let value_json = serde_json::to_string(&value)?;
        let expires_at_ms = common::clock::now_ms() + ttl.as_millis() as i64;

        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value_json, expires_at_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value_json = excluded.value_json,
                expires_at_ms = excluded.expires_at_ms;
        "#,
        )
        .bind(key)
        .bind(value_json)
        .bind(expires_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn invalidate_by_prefix(&self, prefix: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM cache_entries WHERE key LIKE ? ESCAPE '\\'")
            .bind(format!("{}%", escape_like(prefix)))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM cache_entries").execute(&self.pool).await?;
        Ok(())
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
