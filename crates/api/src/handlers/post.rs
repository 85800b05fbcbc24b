//! Handlers for post CRUD.
//!
//! Every write records a revision attributed to the authenticated editor.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use quill_core::post::{
    generate_slug, validate_content, validate_excerpt, validate_slug, validate_status,
    validate_title,
};
use quill_core::types::DbId;
use quill_db::models::post::{CreatePost, Post, UpdatePost};
use quill_db::repositories::PostRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Fetch a post or return 404.
pub(crate) async fn ensure_post(pool: &sqlx::PgPool, id: DbId) -> AppResult<Post> {
    PostRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("post", id))
}

/// POST /posts
///
/// Create a post and its first revision. The slug is derived from the title
/// when not provided.
pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePost>,
) -> AppResult<impl IntoResponse> {
    validate_title(&input.title)?;
    validate_content(&input.content)?;
    if let Some(ref excerpt) = input.excerpt {
        validate_excerpt(excerpt)?;
    }
    if let Some(ref status) = input.status {
        validate_status(status)?;
    }

    let slug = match &input.slug {
        Some(s) => {
            validate_slug(s)?;
            s.clone()
        }
        None => generate_slug(&input.title),
    };

    let caps = state.revision_capabilities.get().await;
    let post = PostRepo::create(&state.pool, &caps, &input, &slug, Some(auth.user_id)).await?;

    tracing::info!(
        user_id = auth.user_id,
        post_id = post.id,
        slug = %post.slug,
        "Post created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse::new(post))))
}

/// GET /posts/{id}
pub async fn get_post(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let post = ensure_post(&state.pool, id).await?;
    Ok(Json(DataResponse::new(post)))
}

/// PUT /posts/{id}
///
/// Partial update. Records a revision of the resulting post unless the body
/// writes no field.
pub async fn update_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePost>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref title) = input.title {
        validate_title(title)?;
    }
    if let Some(ref content) = input.content {
        validate_content(content)?;
    }
    if let Some(ref excerpt) = input.excerpt {
        validate_excerpt(excerpt)?;
    }
    if let Some(ref status) = input.status {
        validate_status(status)?;
    }
    if let Some(ref slug) = input.slug {
        validate_slug(slug)?;
    }

    let caps = state.revision_capabilities.get().await;
    let post = PostRepo::update(&state.pool, &caps, id, &input, Some(auth.user_id))
        .await?
        .ok_or_else(|| AppError::not_found("post", id))?;

    tracing::info!(user_id = auth.user_id, post_id = id, "Post updated");

    Ok(Json(DataResponse::new(post)))
}
