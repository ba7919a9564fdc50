//! Cache Module
//!
//! Redis connection management and key naming for the presence directory
//! and stream admission control.

mod presence_cache;

pub use presence_cache::PresenceCacheService;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key naming.
///
/// Presence keys are partitioned per (tenant, user): concurrent heartbeats
/// from the same identity are commutative last-write-wins TTL refreshes, so
/// no coordination is needed on top of the store.
pub mod keys {
    /// Prefix for presence entries (e.g., "presence:tenant_id:user_id")
    pub const PRESENCE: &str = "presence:";

    /// Prefix for stream admission counters
    pub const STREAM_RATE_LIMIT: &str = "rl:stream";

    /// Key holding one user's presence entry
    #[inline]
    pub fn presence(tenant_id: impl std::fmt::Display, user_id: impl std::fmt::Display) -> String {
        format!("{}{}:{}", PRESENCE, tenant_id, user_id)
    }

    /// SCAN pattern covering one tenant's presence namespace
    #[inline]
    pub fn presence_pattern(tenant_id: impl std::fmt::Display) -> String {
        format!("{}{}:*", PRESENCE, tenant_id)
    }

    /// Key for one user's stream admission window
    #[inline]
    pub fn stream_rate_limit(user_id: impl std::fmt::Display) -> String {
        format!("{}:user:{}", STREAM_RATE_LIMIT, user_id)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn presence_keys_stay_inside_the_tenant_pattern() {
            let key = presence(42, 7);
            assert_eq!(key, "presence:42:7");
            let pattern = presence_pattern(42);
            assert!(key.starts_with(pattern.trim_end_matches('*')));
        }

        #[test]
        fn tenant_namespaces_are_disjoint() {
            let prefix_a = presence_pattern(1);
            let key_b = presence(11, 5);
            // "presence:11:5" must not match "presence:1:*"
            assert!(!key_b.starts_with(prefix_a.trim_end_matches('*')));
        }
    }
}
