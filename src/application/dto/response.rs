//! Response DTOs
//!
//! Wire shapes are camelCase; snowflake ids are serialized as strings so
//! they survive JavaScript number precision.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::{ChatMessage, PresenceEntry};

/// One enriched message as carried in a stream `message` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMessageDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    pub sender_name: String,
    pub body: String,
    pub confirmed: bool,
    /// Display name of the confirming mentor, resolved at read time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmer_name: Option<String>,
    /// Whether the sender is a mentor of the streamed channel
    pub is_mentor: bool,
    pub created_at: String,
}

impl StreamMessageDto {
    /// Build the wire DTO for one message.
    ///
    /// `mentor_set` is the per-connection mentor snapshot; `confirmer_names`
    /// the batch-resolved display names of confirming users.
    pub fn enriched(
        message: &ChatMessage,
        mentor_set: &HashSet<i64>,
        confirmer_names: &HashMap<i64, String>,
    ) -> Self {
        Self {
            id: message.id.to_string(),
            channel_id: message.channel_id.map(|id| id.to_string()),
            kind: message.kind.as_str().to_string(),
            sender_id: message.sender_id.map(|id| id.to_string()),
            sender_name: message.sender_name.clone(),
            body: message.body.clone(),
            confirmed: message.confirmed,
            confirmer_name: message
                .confirmed_by
                .and_then(|id| confirmer_names.get(&id).cloned()),
            is_mentor: message
                .sender_id
                .map(|id| mentor_set.contains(&id))
                .unwrap_or(false),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Plain message shape returned by the send endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    pub sender_name: String,
    pub body: String,
    pub confirmed: bool,
    pub created_at: String,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id.to_string(),
            channel_id: message.channel_id.map(|id| id.to_string()),
            kind: message.kind.as_str().to_string(),
            sender_id: message.sender_id.map(|id| id.to_string()),
            sender_name: message.sender_name,
            body: message.body,
            confirmed: message.confirmed,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// One online user in the presence listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUserDto {
    pub user_id: String,
    pub display_name: String,
}

impl From<PresenceEntry> for PresenceUserDto {
    fn from(entry: PresenceEntry) -> Self {
        Self {
            user_id: entry.user_id.to_string(),
            display_name: entry.display_name,
        }
    }
}

/// `GET /api/v1/presence` response.
#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub users: Vec<PresenceUserDto>,
}

/// `GET /api/v1/chat/unread` response.
#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use crate::domain::MessageKind;

    fn message() -> ChatMessage {
        ChatMessage {
            id: 101,
            tenant_id: 1,
            channel_id: Some(7),
            kind: MessageKind::Message,
            sender_id: Some(11),
            sender_name: "Ada".into(),
            body: "try the worked example".into(),
            confirmed: true,
            confirmed_by: Some(99),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn enrichment_resolves_mentor_flag_and_confirmer_name() {
        let mentor_set: HashSet<i64> = [11].into_iter().collect();
        let names: HashMap<i64, String> = [(99, "Mentor Meg".to_string())].into_iter().collect();

        let dto = StreamMessageDto::enriched(&message(), &mentor_set, &names);
        assert!(dto.is_mentor);
        assert_eq!(dto.confirmer_name.as_deref(), Some("Mentor Meg"));
        assert_eq!(dto.id, "101");
        assert_eq!(dto.channel_id.as_deref(), Some("7"));
    }

    #[test]
    fn unknown_confirmer_resolves_to_none() {
        let dto = StreamMessageDto::enriched(&message(), &HashSet::new(), &HashMap::new());
        assert!(!dto.is_mentor);
        assert_eq!(dto.confirmer_name, None);
        assert!(dto.confirmed);
    }

    #[test]
    fn wire_shape_is_camel_case_with_string_ids() {
        let mentor_set: HashSet<i64> = [11].into_iter().collect();
        let dto = StreamMessageDto::enriched(&message(), &mentor_set, &HashMap::new());
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["id"], "101");
        assert_eq!(json["senderId"], "11");
        assert_eq!(json["isMentor"], true);
        assert_eq!(json["senderName"], "Ada");
        assert!(json.get("confirmerName").is_none());
    }

    #[test]
    fn presence_listing_uses_camel_case() {
        let dto = PresenceUserDto::from(PresenceEntry {
            user_id: 5,
            display_name: "Grace".into(),
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["userId"], "5");
        assert_eq!(json["displayName"], "Grace");
    }
}
