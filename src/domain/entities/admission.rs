//! Stream admission trait.

use async_trait::async_trait;

/// Admission control for new stream connections, keyed by user.
///
/// Answers before any message-repository access happens; a denied user gets
/// a terminal 429 instead of a stream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamAdmission: Send + Sync {
    /// May this user open another stream connection right now?
    async fn admit(&self, user_id: i64) -> bool;
}
