//! Channel Membership Repositories
//!
//! PostgreSQL implementations of the access guard and the mentor directory,
//! both backed by the `channel_members` table owned by the enrollment
//! subsystem.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{ChannelAccessRepository, MentorRepository};
use crate::shared::error::AppError;

/// PostgreSQL access guard implementation.
pub struct PgChannelAccessRepository {
    pool: PgPool,
}

impl PgChannelAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelAccessRepository for PgChannelAccessRepository {
    async fn can_access(
        &self,
        tenant_id: i64,
        user_id: i64,
        channel_id: i64,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                 SELECT 1 FROM channel_members \
                 WHERE tenant_id = $1 AND channel_id = $2 AND user_id = $3 \
             )",
        )
        .bind(tenant_id)
        .bind(channel_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

/// PostgreSQL mentor directory implementation.
pub struct PgMentorRepository {
    pool: PgPool,
}

impl PgMentorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MentorRepository for PgMentorRepository {
    async fn mentors_of(
        &self,
        tenant_id: i64,
        channel_id: i64,
    ) -> Result<HashSet<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM channel_members \
             WHERE tenant_id = $1 AND channel_id = $2 AND role = 'mentor'",
        )
        .bind(tenant_id)
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }
}
