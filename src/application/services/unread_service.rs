//! Unread Counter Service
//!
//! Reports how many messages exist past a cursor in a channel, without
//! transferring bodies. The count shares the stream's cursor semantics but
//! no state with it.

use std::sync::Arc;

use crate::domain::{ChannelAccessRepository, MessageRepository};
use crate::shared::error::AppError;

/// Ceiling reported regardless of true backlog size.
pub const UNREAD_CAP: i64 = 99;

/// Stateless capped count query.
pub struct UnreadService {
    messages: Arc<dyn MessageRepository>,
    access: Arc<dyn ChannelAccessRepository>,
}

impl UnreadService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        access: Arc<dyn ChannelAccessRepository>,
    ) -> Self {
        Self { messages, access }
    }

    /// Count messages after `after_id` in a channel.
    ///
    /// Denied channel access is an authorization answer and surfaces as
    /// Forbidden. Internal failures, whether in the access check or in the
    /// count itself, degrade to zero instead: unread badges are advisory
    /// and must never fail the page that embeds them.
    pub async fn unread_count(
        &self,
        tenant_id: i64,
        user_id: i64,
        channel_id: i64,
        after_id: i64,
    ) -> Result<i64, AppError> {
        match self.access.can_access(tenant_id, user_id, channel_id).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(AppError::Forbidden("No access to this channel".into()));
            }
            Err(e) => {
                tracing::warn!(tenant_id, channel_id, error = %e, "unread access check degraded to zero");
                return Ok(0);
            }
        }

        match self
            .messages
            .count_after(tenant_id, Some(channel_id), after_id, UNREAD_CAP)
            .await
        {
            Ok(count) => Ok(count.min(UNREAD_CAP)),
            Err(e) => {
                tracing::warn!(tenant_id, channel_id, error = %e, "unread count degraded to zero");
                Ok(0)
            }
        }
    }
}
