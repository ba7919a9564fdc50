//! Chat message entity and repository trait.
//!
//! Maps to the `chat_messages` table. Rows are append-only: after creation
//! only the confirmation pair (`confirmed`, `confirmed_by`) may change.
//! Ordering is defined solely by `id`; `created_at` values may collide and
//! are never used to order delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Message kinds stored in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A regular user message
    #[default]
    Message,
    /// A user joined a channel; bookkeeping only, never streamed
    Join,
    /// A platform-generated announcement
    System,
}

impl MessageKind {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s {
            "join" => Self::Join,
            "system" => Self::System,
            _ => Self::Message,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Join => "join",
            Self::System => "system",
        }
    }

    /// Whether messages of this kind are delivered on the stream.
    pub fn is_streamable(&self) -> bool {
        !matches!(self, Self::Join)
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents one message in a channel.
///
/// `channel_id = None` addresses the tenant-wide channel, which is disjoint
/// from every concrete channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Snowflake ID (primary key and the sole ordering key)
    pub id: i64,

    /// Owning tenant
    pub tenant_id: i64,

    /// Channel scope; None = tenant-wide channel
    pub channel_id: Option<i64>,

    /// Kind of message
    pub kind: MessageKind,

    /// Sender user ID, if the message has one (system rows may not)
    pub sender_id: Option<i64>,

    /// Sender display name as captured at send time
    pub sender_name: String,

    /// Message body (up to 4000 characters)
    pub body: String,

    /// Whether a mentor confirmed this message as an answer
    pub confirmed: bool,

    /// User ID of the confirming mentor
    pub confirmed_by: Option<i64>,

    /// Timestamp when the message was created
    pub created_at: DateTime<Utc>,
}

/// Repository trait for chat message access.
///
/// The stream coordinator only ever reads; `create` and `confirm` back the
/// send and confirmation operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a message by id within a tenant.
    async fn find_by_id(&self, tenant_id: i64, id: i64) -> Result<Option<ChatMessage>, AppError>;

    /// Messages with `id > after_id` in (tenant, channel), ascending by id,
    /// JOIN-kind rows excluded, at most `limit` rows.
    async fn find_after(
        &self,
        tenant_id: i64,
        channel_id: Option<i64>,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError>;

    /// Count of streamable messages with `id > after_id` in (tenant, channel),
    /// counting at most `cap` rows.
    async fn count_after(
        &self,
        tenant_id: i64,
        channel_id: Option<i64>,
        after_id: i64,
        cap: i64,
    ) -> Result<i64, AppError>;

    /// Append a new message.
    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, AppError>;

    /// Set the confirmation pair on an existing message.
    async fn confirm(&self, tenant_id: i64, id: i64, confirmed_by: i64) -> Result<(), AppError>;
}
