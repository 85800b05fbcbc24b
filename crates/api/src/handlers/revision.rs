//! Handlers for post revision history and restore.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use quill_core::types::DbId;
use quill_db::repositories::{PostRepo, RevisionRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::post::ensure_post;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /posts/{id}/revisions
///
/// List a post's revisions, newest first.
pub async fn list_revisions(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_post(&state.pool, post_id).await?;

    let caps = state.revision_capabilities.get().await;
    let revisions = RevisionRepo::list_by_post(&state.pool, &caps, post_id).await?;

    Ok(Json(DataResponse::new(revisions)))
}

/// GET /posts/{id}/revisions/{revision_id}
pub async fn get_revision(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path((post_id, revision_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let caps = state.revision_capabilities.get().await;
    let revision = RevisionRepo::find_detail(&state.pool, &caps, post_id, revision_id)
        .await?
        .ok_or_else(|| AppError::not_found("revision", revision_id))?;

    Ok(Json(DataResponse::new(revision)))
}

/// POST /posts/{id}/revisions/{revision_id}/restore
///
/// Roll the post back to the revision. The restore itself is recorded as a
/// new revision attributed to the caller.
pub async fn restore_revision(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((post_id, revision_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    ensure_post(&state.pool, post_id).await?;

    let caps = state.revision_capabilities.get().await;
    let restored =
        PostRepo::restore_revision(&state.pool, &caps, post_id, revision_id, Some(auth.user_id))
            .await?
            .ok_or_else(|| AppError::not_found("revision", revision_id))?;

    tracing::info!(
        user_id = auth.user_id,
        role = %auth.role,
        post_id,
        restored_from = revision_id,
        "Post restore requested"
    );

    Ok(Json(DataResponse::new(restored)))
}
