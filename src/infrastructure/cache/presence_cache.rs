//! Presence Directory Cache
//!
//! Redis-backed, self-expiring "who is online" registry per tenant. Every
//! heartbeat rewrites the entry with a full TTL; entries that stop being
//! refreshed vanish on their own. There is no explicit sign-off and no
//! durable history.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::keys;
use crate::domain::PresenceEntry;
use crate::shared::error::AppError;

/// Keys examined per SCAN iteration.
const SCAN_BATCH: usize = 100;

/// Presence directory backed by per-key TTLs.
#[derive(Clone)]
pub struct PresenceCacheService {
    redis: ConnectionManager,
    presence_ttl: u64,
}

impl PresenceCacheService {
    /// Create a presence cache with the given TTL window in seconds.
    pub fn new(redis: ConnectionManager, presence_ttl: u64) -> Self {
        Self {
            redis,
            presence_ttl,
        }
    }

    /// Upsert a user's presence entry, resetting the TTL to the full window.
    ///
    /// Idempotent: repeated calls within the window are equivalent to one
    /// call followed by a TTL renewal.
    pub async fn set_presence(
        &self,
        tenant_id: i64,
        user_id: i64,
        display_name: &str,
    ) -> Result<(), AppError> {
        let key = keys::presence(tenant_id, user_id);
        let entry = PresenceEntry {
            user_id,
            display_name: display_name.to_string(),
        };
        let value = serde_json::to_string(&entry)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&key, value, self.presence_ttl)
            .await?;

        Ok(())
    }

    /// Enumerate live entries under the tenant's key namespace.
    ///
    /// Walks the keyspace with incremental SCAN cursors (never a blocking
    /// full scan), batch-reads the values, discards anything malformed, and
    /// stops once `limit` entries are collected or the scan is exhausted.
    pub async fn get_online_users(
        &self,
        tenant_id: i64,
        limit: usize,
    ) -> Result<Vec<PresenceEntry>, AppError> {
        let pattern = keys::presence_pattern(tenant_id);
        let mut conn = self.redis.clone();

        let mut users = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !batch.is_empty() {
                let values: Vec<Option<String>> = conn.mget(&batch).await?;
                for value in values.into_iter().flatten() {
                    if let Some(entry) = parse_entry(&value) {
                        users.push(entry);
                        if users.len() >= limit {
                            return Ok(users);
                        }
                    }
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(users)
    }
}

/// Decode one stored presence value, discarding malformed or structurally
/// invalid entries instead of failing the listing.
fn parse_entry(raw: &str) -> Option<PresenceEntry> {
    match serde_json::from_str::<PresenceEntry>(raw) {
        Ok(entry) if !entry.display_name.is_empty() => Some(entry),
        Ok(_) => {
            tracing::debug!("discarding presence entry with empty display name");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "discarding malformed presence entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_entries() {
        let entry = parse_entry(r#"{"user_id":7,"display_name":"Ada"}"#).unwrap();
        assert_eq!(entry.user_id, 7);
        assert_eq!(entry.display_name, "Ada");
    }

    #[test]
    fn discards_malformed_json() {
        assert!(parse_entry("not json").is_none());
        assert!(parse_entry("").is_none());
        assert!(parse_entry(r#"{"user_id":"seven"}"#).is_none());
    }

    #[test]
    fn discards_structurally_invalid_entries() {
        assert!(parse_entry(r#"{"user_id":7,"display_name":""}"#).is_none());
    }
}
