//! Route definitions for posts and their revision history.
//!
//! Registered under `/posts`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{post as posts, revision};
use crate::state::AppState;

/// Post routes, registered as `/posts`.
///
/// ```text
/// POST   /                                        create_post
/// GET    /{id}                                    get_post
/// PUT    /{id}                                    update_post
/// GET    /{id}/revisions                          list_revisions
/// GET    /{id}/revisions/{revision_id}            get_revision
/// POST   /{id}/revisions/{revision_id}/restore    restore_revision
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(posts::create_post))
        .route("/{id}", get(posts::get_post).put(posts::update_post))
        .route("/{id}/revisions", get(revision::list_revisions))
        .route("/{id}/revisions/{revision_id}", get(revision::get_revision))
        .route(
            "/{id}/revisions/{revision_id}/restore",
            post(revision::restore_revision),
        )
}
