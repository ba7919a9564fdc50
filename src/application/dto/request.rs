//! Request DTOs

use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/v1/chat/messages`.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Target channel; absent = tenant-wide channel
    pub channel_id: Option<String>,

    /// Message body
    #[validate(length(min = 1, max = 4000, message = "body must be 1-4000 characters"))]
    pub body: String,
}
