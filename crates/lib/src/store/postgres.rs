//! Postgres-backed thread store. Owns its minimal schema and creates it
//! on connect so deployments need no separate migration step.

use super::{StoreError, StoredMessage, ThreadStore};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS thread_messages (
    id BIGSERIAL PRIMARY KEY,
    thread_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    tool_calls JSONB,
    tool_name TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS thread_messages_thread_idx
    ON thread_messages (thread_id, id);
";

pub struct PostgresThreadStore {
    pool: PgPool,
}

impl PostgresThreadStore {
    /// Connect and ensure the schema exists.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(20).connect(uri).await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        log::info!("connected to postgres thread store");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ThreadStore for PostgresThreadStore {
    async fn history(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let rows = sqlx::query(
            "SELECT role, content, tool_calls, tool_name
             FROM thread_messages WHERE thread_id = $1 ORDER BY id",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let tool_calls: Option<serde_json::Value> = row.try_get("tool_calls")?;
            let tool_calls = match tool_calls {
                Some(v) => Some(serde_json::from_value(v)?),
                None => None,
            };
            messages.push(StoredMessage {
                role: row.try_get("role")?,
                content: row.try_get("content")?,
                tool_calls,
                tool_name: row.try_get("tool_name")?,
            });
        }
        Ok(messages)
    }

    async fn append(&self, thread_id: &str, message: StoredMessage) -> Result<(), StoreError> {
        let tool_calls = message
            .tool_calls
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        sqlx::query(
            "INSERT INTO thread_messages (thread_id, role, content, tool_calls, tool_name)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(thread_id)
        .bind(&message.role)
        .bind(&message.content)
        .bind(tool_calls)
        .bind(&message.tool_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, thread_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM thread_messages WHERE thread_id = $1")
            .bind(thread_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
