//! Presence Service
//!
//! Best-effort wrapper around the presence directory. Presence is a UI
//! affordance, not transcript content: heartbeats absorb storage failures
//! and the listing degrades to empty rather than surfacing an error, so a
//! broken or unconfigured store never blocks the surrounding page.

use crate::domain::PresenceEntry;
use crate::infrastructure::cache::PresenceCacheService;
use crate::infrastructure::metrics;

/// Presence operations exposed to the HTTP layer.
pub struct PresenceService {
    store: Option<PresenceCacheService>,
    max_online: usize,
}

impl PresenceService {
    /// Presence backed by a live store.
    pub fn new(store: PresenceCacheService, max_online: usize) -> Self {
        Self {
            store: Some(store),
            max_online,
        }
    }

    /// Presence with no backing store: heartbeats are no-ops and the
    /// listing is always empty.
    pub fn disabled(max_online: usize) -> Self {
        Self {
            store: None,
            max_online,
        }
    }

    /// Clamp a requested listing size to `1..=max_online`.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.max_online).clamp(1, self.max_online)
    }

    /// Record a heartbeat, refreshing the user's TTL window. Never fails.
    pub async fn record_heartbeat(&self, tenant_id: i64, user_id: i64, display_name: &str) {
        let Some(store) = &self.store else { return };

        match store.set_presence(tenant_id, user_id, display_name).await {
            Ok(()) => metrics::PRESENCE_HEARTBEATS_TOTAL.inc(),
            Err(e) => {
                tracing::warn!(tenant_id, user_id, error = %e, "presence heartbeat dropped");
            }
        }
    }

    /// List currently-online users for a tenant. Never fails.
    pub async fn online_users(&self, tenant_id: i64, limit: usize) -> Vec<PresenceEntry> {
        let Some(store) = &self.store else {
            return Vec::new();
        };

        match store.get_online_users(tenant_id, limit).await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(tenant_id, error = %e, "presence listing degraded to empty");
                Vec::new()
            }
        }
    }
}
