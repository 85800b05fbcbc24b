pub mod health;
pub mod post;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /posts                                           create
/// /posts/{id}                                      get, update
/// /posts/{id}/revisions                            list revisions
/// /posts/{id}/revisions/{revision_id}              get revision
/// /posts/{id}/revisions/{revision_id}/restore      restore (POST)
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/posts", post::router())
}
