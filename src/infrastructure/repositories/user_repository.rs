//! User Repository Implementation
//!
//! Batch display-name lookups against the platform's users table.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::UserRepository;
use crate::shared::error::AppError;

/// PostgreSQL user directory implementation.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserNameRow {
    id: i64,
    display_name: String,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn display_names(
        &self,
        tenant_id: i64,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, String>, AppError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, UserNameRow>(
            "SELECT id, display_name FROM users \
             WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.id, r.display_name)).collect())
    }
}
