//! Unread Count Handler

use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;

use crate::application::dto::response::UnreadResponse;
use crate::application::services::UnreadService;
use crate::infrastructure::repositories::{PgChannelAccessRepository, PgMessageRepository};
use crate::presentation::middleware::TenantContext;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Unread count query parameters
#[derive(Debug, Deserialize)]
pub struct UnreadQuery {
    pub channel_id: Option<String>,
    pub after: Option<String>,
}

/// Count messages after a cursor in a channel.
///
/// The tenant-wide channel is not supported here: a channel id is required.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<UnreadQuery>,
) -> Result<Json<UnreadResponse>, AppError> {
    let channel_id: i64 = query
        .channel_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("channel_id is required".into()))?
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid channel ID".into()))?;

    let after = query
        .after
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    let service = UnreadService::new(
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgChannelAccessRepository::new(state.db.clone())),
    );

    let count = service
        .unread_count(ctx.tenant_id, ctx.user_id, channel_id, after)
        .await?;

    Ok(Json(UnreadResponse { count }))
}
