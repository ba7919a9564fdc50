//! Presence Handlers

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::application::dto::response::{PresenceResponse, PresenceUserDto};
use crate::application::services::PresenceService;
use crate::infrastructure::cache::PresenceCacheService;
use crate::presentation::middleware::TenantContext;
use crate::startup::AppState;

/// Presence listing query parameters
#[derive(Debug, Deserialize)]
pub struct PresenceQuery {
    pub limit: Option<usize>,
}

/// Build the presence service for this request.
fn presence_service(state: &AppState) -> PresenceService {
    let settings = &state.settings.presence;
    if settings.enabled {
        PresenceService::new(
            PresenceCacheService::new(state.redis.clone(), settings.ttl_secs),
            settings.max_online,
        )
    } else {
        PresenceService::disabled(settings.max_online)
    }
}

/// Record a heartbeat for the calling user.
///
/// Always succeeds: presence is best-effort and a broken store must never
/// fail the caller.
pub async fn heartbeat(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> StatusCode {
    presence_service(&state)
        .record_heartbeat(ctx.tenant_id, ctx.user_id, &ctx.display_name)
        .await;

    StatusCode::NO_CONTENT
}

/// List currently-online users for the calling user's tenant.
pub async fn list_online(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<PresenceQuery>,
) -> Json<PresenceResponse> {
    let service = presence_service(&state);
    let limit = service.clamp_limit(query.limit);
    let users = service.online_users(ctx.tenant_id, limit).await;

    Json(PresenceResponse {
        users: users.into_iter().map(PresenceUserDto::from).collect(),
    })
}
