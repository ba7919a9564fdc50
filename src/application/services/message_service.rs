//! Message Service
//!
//! The write path the stream observes: sending a message and the single
//! permitted mutation, confirming one as an answer.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    ChannelAccessRepository, ChatMessage, MentorRepository, MessageKind, MessageRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Maximum message body length in characters.
pub const MAX_BODY_CHARS: usize = 4000;

/// Send and confirmation operations.
pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    access: Arc<dyn ChannelAccessRepository>,
    mentors: Arc<dyn MentorRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        access: Arc<dyn ChannelAccessRepository>,
        mentors: Arc<dyn MentorRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            messages,
            access,
            mentors,
            id_generator,
        }
    }

    /// Append a new message to a channel (or the tenant-wide scope).
    ///
    /// The sender's display name is captured on the row at send time;
    /// everything else about the row is immutable afterwards apart from the
    /// confirmation pair.
    pub async fn send_message(
        &self,
        tenant_id: i64,
        sender_id: i64,
        sender_name: &str,
        channel_id: Option<i64>,
        body: String,
    ) -> Result<ChatMessage, AppError> {
        if body.trim().is_empty() {
            return Err(AppError::Validation("Message body must not be empty".into()));
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(AppError::Validation(format!(
                "Message body too long (max {} characters)",
                MAX_BODY_CHARS
            )));
        }

        if let Some(channel) = channel_id {
            if !self.access.can_access(tenant_id, sender_id, channel).await? {
                return Err(AppError::Forbidden("No access to this channel".into()));
            }
        }

        let message = ChatMessage {
            id: self.id_generator.generate(),
            tenant_id,
            channel_id,
            kind: MessageKind::Message,
            sender_id: Some(sender_id),
            sender_name: sender_name.to_string(),
            body,
            confirmed: false,
            confirmed_by: None,
            created_at: Utc::now(),
        };

        self.messages.create(&message).await
    }

    /// Mark a message as a confirmed answer.
    ///
    /// Only mentors of the message's channel may confirm. The confirmer's
    /// display name is not written to the row; readers resolve it at
    /// delivery time.
    pub async fn confirm_message(
        &self,
        tenant_id: i64,
        user_id: i64,
        message_id: i64,
    ) -> Result<(), AppError> {
        let message = self
            .messages
            .find_by_id(tenant_id, message_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message {} not found", message_id)))?;

        let channel_id = message.channel_id.ok_or_else(|| {
            AppError::BadRequest("Messages in the tenant-wide channel cannot be confirmed".into())
        })?;

        let mentor_set = self.mentors.mentors_of(tenant_id, channel_id).await?;
        if !mentor_set.contains(&user_id) {
            return Err(AppError::Forbidden(
                "Only channel mentors can confirm answers".into(),
            ));
        }

        self.messages.confirm(tenant_id, message_id, user_id).await
    }
}
