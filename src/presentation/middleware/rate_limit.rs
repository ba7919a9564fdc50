//! Stream Admission Control
//!
//! Redis-based sliding-window limiter bounding how fast one user may open
//! new stream connections. The window lives in a sorted set whose members
//! are unique request markers scored by timestamp; a Lua script trims,
//! counts, and records atomically so concurrent opens from the same user
//! cannot race past the limit.

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::config::RateLimitSettings;
use crate::domain::StreamAdmission;
use crate::infrastructure::cache::keys;

/// Sliding-window limiter for stream connections, keyed per user.
#[derive(Clone)]
pub struct StreamRateLimiter {
    redis: ConnectionManager,
    config: RateLimitSettings,
}

impl StreamRateLimiter {
    pub fn new(redis: ConnectionManager, config: RateLimitSettings) -> Self {
        Self { redis, config }
    }

    /// Requests allowed in one window, burst included.
    fn max_connections(&self) -> u32 {
        max_connections_for(&self.config)
    }
}

/// Connections allowed per window for the given settings.
fn max_connections_for(config: &RateLimitSettings) -> u32 {
    config.stream_connections_per_window + config.burst_allowance
}

#[async_trait]
impl StreamAdmission for StreamRateLimiter {
    /// Check whether this user may open another stream connection.
    ///
    /// Fails open: if Redis is unreachable the connection is admitted and
    /// the error logged. An admission-store outage must not take every
    /// stream down with it.
    async fn admit(&self, user_id: i64) -> bool {
        let key = keys::stream_rate_limit(user_id);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_ms = (self.config.window_seconds * 1000) as i64;
        let window_start = now_ms - window_ms;
        let max_connections = self.max_connections();

        let mut conn = self.redis.clone();

        let script = redis::Script::new(
            r#"
            local key = KEYS[1]
            local now_ms = tonumber(ARGV[1])
            local window_start = tonumber(ARGV[2])
            local max_requests = tonumber(ARGV[3])
            local window_seconds = tonumber(ARGV[4])

            -- Drop markers that fell out of the window
            redis.call('ZREMRANGEBYSCORE', key, '-inf', window_start)

            local current = redis.call('ZCARD', key)

            if current < max_requests then
                local member = now_ms .. ':' .. math.random(1000000)
                redis.call('ZADD', key, now_ms, member)
                redis.call('EXPIRE', key, window_seconds + 1)
                return 1
            end

            return 0
            "#,
        );

        let result: Result<i64, redis::RedisError> = script
            .key(&key)
            .arg(now_ms)
            .arg(window_start)
            .arg(max_connections as i64)
            .arg(self.config.window_seconds as i64)
            .invoke_async(&mut conn)
            .await;

        match result {
            Ok(allowed) => {
                if allowed != 1 {
                    tracing::warn!(user_id, "stream connection rejected by admission window");
                }
                allowed == 1
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "admission check failed; admitting");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_allowance_extends_the_window() {
        let config = RateLimitSettings {
            stream_connections_per_window: 10,
            window_seconds: 60,
            burst_allowance: 5,
        };
        assert_eq!(max_connections_for(&config), 15);
    }
}
