//! Message Repository Implementation
//!
//! PostgreSQL implementation of chat message access with keyset range
//! queries. The `id > cursor` predicate over the snowflake primary key is
//! what gives the stream its gap-free, duplicate-free resumption: ids are
//! totally ordered and never reused, so a range query from the highest
//! delivered id is exact.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ChatMessage, MessageKind, MessageRepository};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
/// Maps to the chat_messages table schema defined in the migration.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    tenant_id: i64,
    channel_id: Option<i64>,
    kind: String,
    sender_id: Option<i64>,
    sender_name: String,
    body: String,
    confirmed: bool,
    confirmed_by: Option<i64>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    /// Converts a database row to the domain entity.
    fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            tenant_id: self.tenant_id,
            channel_id: self.channel_id,
            kind: MessageKind::from_str(&self.kind),
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            body: self.body,
            confirmed: self.confirmed,
            confirmed_by: self.confirmed_by,
            created_at: self.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, tenant_id, channel_id, kind, sender_id, \
                              sender_name, body, confirmed, confirmed_by, created_at";

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn find_by_id(&self, tenant_id: i64, id: i64) -> Result<Option<ChatMessage>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM chat_messages WHERE tenant_id = $1 AND id = $2",
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_message()))
    }

    /// Keyset query: streamable messages after the cursor, oldest first.
    ///
    /// JOIN rows are bookkeeping and are excluded at the query level so a
    /// polling cycle never spends its batch on them. A NULL channel is the
    /// tenant-wide scope, disjoint from every concrete channel.
    async fn find_after(
        &self,
        tenant_id: i64,
        channel_id: Option<i64>,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        // Cap limit to prevent excessive queries
        let limit = limit.clamp(1, 100);

        let rows = match channel_id {
            Some(channel) => {
                sqlx::query_as::<_, MessageRow>(&format!(
                    "SELECT {SELECT_COLUMNS} FROM chat_messages \
                     WHERE tenant_id = $1 AND channel_id = $2 AND id > $3 AND kind <> 'join' \
                     ORDER BY id ASC \
                     LIMIT $4",
                ))
                .bind(tenant_id)
                .bind(channel)
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MessageRow>(&format!(
                    "SELECT {SELECT_COLUMNS} FROM chat_messages \
                     WHERE tenant_id = $1 AND channel_id IS NULL AND id > $2 AND kind <> 'join' \
                     ORDER BY id ASC \
                     LIMIT $3",
                ))
                .bind(tenant_id)
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }

    /// Count streamable messages after the cursor, scanning at most `cap`
    /// rows so a huge backlog costs the same as a small one.
    async fn count_after(
        &self,
        tenant_id: i64,
        channel_id: Option<i64>,
        after_id: i64,
        cap: i64,
    ) -> Result<i64, AppError> {
        let cap = cap.max(1);

        let count = match channel_id {
            Some(channel) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM ( \
                         SELECT 1 FROM chat_messages \
                         WHERE tenant_id = $1 AND channel_id = $2 AND id > $3 AND kind <> 'join' \
                         LIMIT $4 \
                     ) capped",
                )
                .bind(tenant_id)
                .bind(channel)
                .bind(after_id)
                .bind(cap)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM ( \
                         SELECT 1 FROM chat_messages \
                         WHERE tenant_id = $1 AND channel_id IS NULL AND id > $2 AND kind <> 'join' \
                         LIMIT $3 \
                     ) capped",
                )
                .bind(tenant_id)
                .bind(after_id)
                .bind(cap)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(count)
    }

    /// Append a new message.
    ///
    /// The id is a pre-generated snowflake from the application layer.
    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "INSERT INTO chat_messages \
                 (id, tenant_id, channel_id, kind, sender_id, sender_name, body) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SELECT_COLUMNS}",
        ))
        .bind(message.id)
        .bind(message.tenant_id)
        .bind(message.channel_id)
        .bind(message.kind.as_str())
        .bind(message.sender_id)
        .bind(&message.sender_name)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    /// Set the confirmation pair. The only mutation chat_messages permits.
    async fn confirm(&self, tenant_id: i64, id: i64, confirmed_by: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE chat_messages SET confirmed = TRUE, confirmed_by = $3 \
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(confirmed_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_conversion_preserves_scope_and_kind() {
        let row = MessageRow {
            id: 9,
            tenant_id: 2,
            channel_id: None,
            kind: "system".into(),
            sender_id: None,
            sender_name: "Platform".into(),
            body: "maintenance window tonight".into(),
            confirmed: false,
            confirmed_by: None,
            created_at: Utc::now(),
        };
        let message = row.into_message();
        assert_eq!(message.kind, MessageKind::System);
        assert_eq!(message.channel_id, None);
        assert_eq!(message.sender_id, None);
    }
}
