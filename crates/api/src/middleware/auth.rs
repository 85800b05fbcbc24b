//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use quill_core::error::CoreError;
use quill_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Editor identified by the `Authorization: Bearer <token>` header.
///
/// Every post and revision endpoint takes this extractor; `user_id` is
/// recorded as the editor of any revision the request writes.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The editor's `users.id` (from `claims.sub`).
    pub user_id: DbId,
    /// The role name from the token.
    pub role: String,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        let claims = state
            .config
            .jwt
            .verify(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
