//! User directory trait.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Display-name resolution against the platform's user table.
///
/// Confirmer names are resolved through this at read time rather than being
/// stored on messages, keeping the message store single-writer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Resolve display names for a set of user ids within a tenant.
    /// Unknown ids are simply absent from the result.
    async fn display_names(
        &self,
        tenant_id: i64,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, String>, AppError>;
}
