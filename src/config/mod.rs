//! Configuration Management
//!
//! Layered settings loading: defaults, config files, environment variables.

mod settings;

pub use settings::{
    CorsSettings, DatabaseSettings, JwtSettings, PresenceSettings, RateLimitSettings,
    RedisSettings, ServerSettings, Settings, SnowflakeSettings, StreamSettings,
};
