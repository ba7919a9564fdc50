//! Message Handlers
//!
//! The write path: sending a message and confirming one as an answer.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::application::dto::request::SendMessageRequest;
use crate::application::dto::response::MessageResponse;
use crate::application::services::MessageService;
use crate::infrastructure::repositories::{
    PgChannelAccessRepository, PgMentorRepository, PgMessageRepository,
};
use crate::presentation::middleware::TenantContext;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn message_service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgChannelAccessRepository::new(state.db.clone())),
        Arc::new(PgMentorRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

/// Send a message to a channel (or the tenant-wide scope).
pub async fn send_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let channel_id = match body.channel_id.as_deref() {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| AppError::BadRequest("Invalid channel ID".into()))?,
        ),
        None => None,
    };

    let message = message_service(&state)
        .send_message(
            ctx.tenant_id,
            ctx.user_id,
            &ctx.display_name,
            channel_id,
            body.body,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Confirm a message as an answer (channel mentors only).
pub async fn confirm_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(message_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let message_id: i64 = message_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid message ID".into()))?;

    message_service(&state)
        .confirm_message(ctx.tenant_id, ctx.user_id, message_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
