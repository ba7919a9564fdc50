//! Message Stream Handler
//!
//! Opens one bounded-lifetime SSE connection delivering new chat messages
//! for a channel. Resumption is cursor-based: the client's `Last-Event-ID`
//! header (set automatically by EventSource on reconnect) wins over the
//! `cursor` query parameter; with neither, delivery starts from the
//! beginning of the channel.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::{header, HeaderMap},
    response::sse::{Event, Sse},
    response::{AppendHeaders, IntoResponse},
};
use futures::StreamExt;
use serde::Deserialize;

use crate::application::services::{StreamFrame, StreamService};
use crate::domain::{ChannelAccessRepository, StreamAdmission};
use crate::infrastructure::repositories::{
    PgChannelAccessRepository, PgMentorRepository, PgMessageRepository, PgUserRepository,
};
use crate::presentation::middleware::{StreamRateLimiter, TenantContext};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Stream query parameters
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub channel_id: Option<String>,
    pub cursor: Option<String>,
}

/// Open a message stream connection.
pub async fn open_stream(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let channel_id = match query.channel_id.as_deref() {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| AppError::BadRequest("Invalid channel ID".into()))?,
        ),
        None => None,
    };

    let access = PgChannelAccessRepository::new(state.db.clone());
    let admission = StreamRateLimiter::new(state.redis.clone(), state.settings.rate_limit.clone());
    authorize_stream(&access, &admission, &ctx, channel_id).await?;

    let cursor = resolve_cursor(
        headers
            .get("last-event-id")
            .and_then(|v| v.to_str().ok()),
        query.cursor.as_deref(),
    );

    let service = StreamService::new(
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgMentorRepository::new(state.db.clone())),
        Arc::new(PgUserRepository::new(state.db.clone())),
        state.settings.stream.clone(),
    );

    tracing::debug!(
        tenant_id = ctx.tenant_id,
        user_id = ctx.user_id,
        ?channel_id,
        cursor,
        "stream connection opened"
    );

    let stream = service
        .frames(ctx.tenant_id, channel_id, cursor)
        .map(frame_to_event);

    Ok((
        AppendHeaders([
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            // Tell nginx-style intermediaries not to buffer the stream
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ]),
        Sse::new(stream),
    ))
}

/// Admission checks in contract order: channel access first, then the
/// per-user connection window. Runs before any message-repository access;
/// a rejected caller never touches the message store.
async fn authorize_stream(
    access: &dyn ChannelAccessRepository,
    admission: &dyn StreamAdmission,
    ctx: &TenantContext,
    channel_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(channel) = channel_id {
        if !access.can_access(ctx.tenant_id, ctx.user_id, channel).await? {
            return Err(AppError::Forbidden("No access to this channel".into()));
        }
    }

    if !admission.admit(ctx.user_id).await {
        return Err(AppError::RateLimited);
    }

    Ok(())
}

/// Resolve the resume cursor. The protocol-level `Last-Event-ID` is
/// authoritative over the query parameter; with neither (or junk in both),
/// delivery starts from the beginning of the channel.
fn resolve_cursor(last_event_id: Option<&str>, query_cursor: Option<&str>) -> i64 {
    last_event_id
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| query_cursor.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(0)
}

/// Encode one coordinator frame as an SSE event.
///
/// An encoding failure surfaces as an `Err` item, which tears the
/// connection down without writing a partial frame.
fn frame_to_event(frame: StreamFrame) -> Result<Event, axum::Error> {
    match frame {
        StreamFrame::Batch { cursor, messages } => Event::default()
            .id(cursor.to_string())
            .event("message")
            .json_data(&messages),
        StreamFrame::KeepAlive => Ok(Event::default().comment("ping")),
        StreamFrame::Reconnect => Ok(Event::default().event("reconnect").data("{}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::domain::{MockChannelAccessRepository, MockStreamAdmission};

    fn ctx() -> TenantContext {
        TenantContext {
            tenant_id: 1,
            user_id: 5,
            display_name: "Ada".into(),
        }
    }

    #[test]
    fn header_cursor_wins_over_query_cursor() {
        assert_eq!(resolve_cursor(Some("42"), Some("7")), 42);
        assert_eq!(resolve_cursor(None, Some("7")), 7);
        assert_eq!(resolve_cursor(None, None), 0);
    }

    #[test]
    fn junk_cursors_fall_back() {
        assert_eq!(resolve_cursor(Some("not-a-cursor"), Some("7")), 7);
        assert_eq!(resolve_cursor(Some(" 42 "), None), 42);
        assert_eq!(resolve_cursor(Some(""), Some("")), 0);
    }

    #[tokio::test]
    async fn channel_access_is_checked_before_admission() {
        let mut access = MockChannelAccessRepository::new();
        access.expect_can_access().returning(|_, _, _| Ok(false));

        // No admit expectation: consulting the window after an access
        // denial would panic the mock.
        let admission = MockStreamAdmission::new();

        let result = authorize_stream(&access, &admission, &ctx(), Some(7)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn exhausted_window_is_rejected_with_too_many_requests() {
        let mut access = MockChannelAccessRepository::new();
        access.expect_can_access().returning(|_, _, _| Ok(true));

        let mut admission = MockStreamAdmission::new();
        admission.expect_admit().returning(|_| false);

        let result = authorize_stream(&access, &admission, &ctx(), Some(7)).await;
        assert!(matches!(result, Err(AppError::RateLimited)));
    }

    #[tokio::test]
    async fn tenant_wide_stream_skips_the_channel_guard() {
        let access = MockChannelAccessRepository::new();
        let mut admission = MockStreamAdmission::new();
        admission.expect_admit().returning(|_| true);

        authorize_stream(&access, &admission, &ctx(), None)
            .await
            .unwrap();
    }
}
