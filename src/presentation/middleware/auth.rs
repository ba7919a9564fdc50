//! Authentication Middleware
//!
//! Validates platform-issued JWTs and resolves the tenant context for the
//! request. Tokens are minted by the platform's auth service; this core
//! only verifies them.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;
use crate::startup::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Tenant ID
    pub tid: i64,
    /// Display name
    pub name: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Resolved tenant context, inserted as a request extension.
///
/// Every query, cache key, and permission check downstream is scoped by
/// `tenant_id`; nothing in this service crosses that boundary.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: i64,
    pub user_id: i64,
    pub display_name: String,
}

/// Decode and validate a bearer token into a tenant context.
fn decode_tenant_context(token: &str, secret: &[u8]) -> Result<TenantContext, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".into())
        }
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    let user_id: i64 = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token claims".into()))?;

    Ok(TenantContext {
        tenant_id: token_data.claims.tid,
        user_id,
        display_name: token_data.claims.name,
    })
}

/// Middleware resolving the tenant context for protected routes.
///
/// Requests without a valid context are rejected with 401 before any
/// handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let context = decode_tenant_context(token, state.settings.jwt.secret.as_bytes())?;

    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

    fn token(claims: &Claims) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn claims() -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: "42".into(),
            tid: 7,
            name: "Ada".into(),
            exp: now + 600,
            iat: now,
        }
    }

    #[test]
    fn valid_token_resolves_the_tenant_context() {
        let ctx = decode_tenant_context(&token(&claims()), SECRET).unwrap();
        assert_eq!(ctx.tenant_id, 7);
        assert_eq!(ctx.user_id, 42);
        assert_eq!(ctx.display_name, "Ada");
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let mut expired = claims();
        expired.iat -= 7200;
        expired.exp = expired.iat + 60;
        assert!(matches!(
            decode_tenant_context(&token(&expired), SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        assert!(matches!(
            decode_tenant_context(&token(&claims()), b"another-secret-another-secret!!!"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn non_numeric_subject_is_unauthorized() {
        let mut bad = claims();
        bad.sub = "ada@example.com".into();
        assert!(matches!(
            decode_tenant_context(&token(&bad), SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }
}
