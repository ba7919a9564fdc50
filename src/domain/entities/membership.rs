//! Channel membership traits: the access guard and the mentor directory.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Module-level access checks for channels.
///
/// Membership data is owned by the course/enrollment subsystem; this core
/// only asks yes/no questions of it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelAccessRepository: Send + Sync {
    /// May `user_id` read `channel_id` within `tenant_id`?
    async fn can_access(
        &self,
        tenant_id: i64,
        user_id: i64,
        channel_id: i64,
    ) -> Result<bool, AppError>;
}

/// Mentor lookups for a channel.
///
/// The stream coordinator snapshots this set once per connection and holds
/// it fixed for the connection's lifetime; a mentor added or removed
/// mid-connection is reflected only after the client reconnects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MentorRepository: Send + Sync {
    /// The set of user ids recognized as mentors for a channel.
    async fn mentors_of(
        &self,
        tenant_id: i64,
        channel_id: i64,
    ) -> Result<HashSet<i64>, AppError>;
}
