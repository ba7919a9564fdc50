//! Presence entry value object.

use serde::{Deserialize, Serialize};

/// The value stored at `presence:{tenant}:{user}` on every heartbeat.
///
/// There is no explicit sign-off: an entry exists exactly as long as the
/// storage-layer TTL since the last heartbeat, and absence is
/// indistinguishable from "never seen".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub user_id: i64,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_through_json() {
        let entry = PresenceEntry {
            user_id: 42,
            display_name: "Ada".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(serde_json::from_str::<PresenceEntry>(&json).unwrap(), entry);
    }
}
